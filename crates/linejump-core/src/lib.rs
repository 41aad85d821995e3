//! Linejump Core - line correspondence between file revisions
//!
//! Given a unified diff between two revisions of a file, this library maps
//! a line number in one revision to the matching position in the other,
//! in both directions. Lines with no counterpart map to a gap between lines.

pub mod change;
pub mod correspondence;
pub mod diff;
pub mod error;
pub mod git;
pub mod mapper;
pub mod patch;
pub mod position;
pub mod service;

pub use change::{Change, DiffChunk, FileDiff};
pub use correspondence::{build_table, CorrespondenceTable};
pub use diff::{DiffEngine, DiffError};
pub use error::LineMapError;
pub use git::{DiffRequest, GitError};
pub use mapper::{Direction, LineMapper};
pub use position::{CorrespondencePair, CorrespondenceRun, LinePosition};
pub use service::{
    compute_file_line_map, compute_line_map, FileDiffMap, FileLineMaps, LineMapIndex,
    OwnedFileLineMaps,
};
