//! Correspondence table construction
//!
//! A file's chunks are walked in order. Before each chunk the unchanged lines
//! the diff leaves out are filled in as identity runs; inside a chunk each
//! change is reduced to a single-line run, with a delete directly followed by
//! an add at the same offset treated as one edited line rather than a removal
//! plus an insertion.

use crate::change::{Change, DiffChunk};
use crate::error::LineMapError;
use crate::position::{CorrespondenceRun, LinePosition};

/// Ordered runs for one file plus where the diff's coverage ends
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorrespondenceTable {
    pub runs: Vec<CorrespondenceRun>,
    /// First old line past the last chunk
    pub old_end: u32,
    /// First new line past the last chunk
    pub new_end: u32,
}

/// Emit runs for the unchanged lines between the counters and the next
/// chunk's start, leaving the counters at the start.
///
/// At most three runs come out however far the chunk is from the counters.
pub fn fill_gap(
    old_line: &mut u32,
    new_line: &mut u32,
    old_start: u32,
    new_start: u32,
    out: &mut Vec<CorrespondenceRun>,
) {
    let shared = old_start
        .saturating_sub(*old_line)
        .min(new_start.saturating_sub(*new_line));
    if shared > 0 {
        out.push(CorrespondenceRun::both(*old_line, *new_line, shared));
        *old_line += shared;
        *new_line += shared;
    }
    if *old_line < old_start {
        let len = old_start - *old_line;
        out.push(CorrespondenceRun::removed(*old_line, new_line.saturating_sub(1), len));
        *old_line = old_start;
    }
    if *new_line < new_start {
        let len = new_start - *new_line;
        out.push(CorrespondenceRun::inserted(old_line.saturating_sub(1), *new_line, len));
        *new_line = new_start;
    }
}

/// Reduce one chunk's changes to single-line runs
pub fn reduce_chunk(
    chunk: &DiffChunk,
    out: &mut Vec<CorrespondenceRun>,
) -> Result<(), LineMapError> {
    let (Some(old_start), Some(new_start)) = (chunk.old_begin(), chunk.new_begin()) else {
        return Err(out_of_range(chunk));
    };
    let mut old_line = old_start;
    let mut new_line = new_start;

    let mut changes = chunk.changes.iter().peekable();
    while let Some(change) = changes.next() {
        match *change {
            Change::Deleted { old } => {
                if let Some(&&Change::Added { new }) = changes.peek() {
                    if same_offset(old, old_start, new, new_start) {
                        changes.next();
                        out.push(CorrespondenceRun::both(old, new, 1));
                        old_line = old_line.saturating_add(1);
                        new_line = new_line.saturating_add(1);
                        continue;
                    }
                }
                out.push(CorrespondenceRun::removed(old, new_line.saturating_sub(1), 1));
                old_line = old_line.saturating_add(1);
            }
            Change::Added { new } => {
                out.push(CorrespondenceRun::inserted(old_line.saturating_sub(1), new, 1));
                new_line = new_line.saturating_add(1);
            }
            Change::Context { old, new } => {
                out.push(CorrespondenceRun::both(old, new, 1));
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
            }
        }
    }
    Ok(())
}

fn same_offset(old: u32, old_start: u32, new: u32, new_start: u32) -> bool {
    i64::from(old) - i64::from(old_start) == i64::from(new) - i64::from(new_start)
}

fn out_of_range(chunk: &DiffChunk) -> LineMapError {
    LineMapError::malformed(
        0,
        format!(
            "chunk -{},{} +{},{} runs past the largest line number",
            chunk.old_start, chunk.old_lines, chunk.new_start, chunk.new_lines
        ),
    )
}

/// Build the full table for one file's chunks.
///
/// Chunks must be strictly ordered and non-overlapping on both sides.
pub fn build_table(chunks: &[DiffChunk]) -> Result<CorrespondenceTable, LineMapError> {
    let mut runs = Vec::new();
    let mut old_line = 1u32;
    let mut new_line = 1u32;

    for (idx, chunk) in chunks.iter().enumerate() {
        let bounds = (
            chunk.old_begin(),
            chunk.new_begin(),
            chunk.old_end(),
            chunk.new_end(),
        );
        let (Some(old_start), Some(new_start), Some(old_end), Some(new_end)) = bounds else {
            return Err(out_of_range(chunk));
        };
        if old_start == 0 || new_start == 0 {
            return Err(LineMapError::malformed(
                0,
                format!("chunk {} starts at line 0 but is not empty", idx + 1),
            ));
        }
        if old_start < old_line || new_start < new_line {
            return Err(LineMapError::malformed(
                0,
                format!(
                    "chunk {} (-{},+{}) overlaps or precedes the previous chunk \
                     (ending before -{},+{})",
                    idx + 1,
                    chunk.old_start,
                    chunk.new_start,
                    old_line,
                    new_line
                ),
            ));
        }

        fill_gap(&mut old_line, &mut new_line, old_start, new_start, &mut runs);
        reduce_chunk(chunk, &mut runs)?;

        old_line = old_end;
        new_line = new_end;
    }

    check_ordering(&runs)?;

    tracing::debug!(
        chunks = chunks.len(),
        runs = runs.len(),
        insertions = chunks.iter().map(DiffChunk::insertions).sum::<usize>(),
        deletions = chunks.iter().map(DiffChunk::deletions).sum::<usize>(),
        old_end = old_line,
        new_end = new_line,
        "built correspondence table"
    );

    Ok(CorrespondenceTable {
        runs,
        old_end: old_line,
        new_end: new_line,
    })
}

/// Exact lines must strictly increase on each side
fn check_ordering(runs: &[CorrespondenceRun]) -> Result<(), LineMapError> {
    let mut last_old = 0u32;
    let mut last_new = 0u32;
    for run in runs.iter().filter(|run| run.len > 0) {
        advance_side(run.old, run.len, &mut last_old, "old")?;
        advance_side(run.new, run.len, &mut last_new, "new")?;
    }
    Ok(())
}

fn advance_side(
    start: LinePosition,
    len: u32,
    last: &mut u32,
    side: &str,
) -> Result<(), LineMapError> {
    let LinePosition::Exact(first) = start else {
        return Ok(());
    };
    if first <= *last {
        return Err(LineMapError::malformed(
            0,
            format!("{} line {} appears out of order", side, first),
        ));
    }
    *last = first.checked_add(len - 1).ok_or_else(|| {
        LineMapError::malformed(
            0,
            format!("{} line {} runs past the largest line number", side, first),
        )
    })?;
    Ok(())
}
