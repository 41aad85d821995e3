//! Errors for building and querying line maps

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineMapError {
    /// Unparsable hunk header, truncated hunk body, or chunks out of order.
    /// `line` is the 1-based input line, or 0 when the problem was found
    /// after parsing.
    #[error("Malformed diff at line {line}: {reason}")]
    MalformedDiff { line: usize, reason: String },
    /// The path is neither the old nor the new name of any file in the diff
    #[error("File not in diff: {0}")]
    FileNotInDiff(String),
}

impl LineMapError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        LineMapError::MalformedDiff {
            line,
            reason: reason.into(),
        }
    }
}
