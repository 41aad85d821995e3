//! Positions in one revision and the pairs that link two revisions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a line from one revision lands in another revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum LinePosition {
    /// A real line in the target revision
    Exact(u32),
    /// No counterpart; the position right after the given line (`Gap(0)` is
    /// before the first line)
    Gap(u32),
}

impl LinePosition {
    /// The exact line, if there is one
    pub fn exact(&self) -> Option<u32> {
        match *self {
            LinePosition::Exact(line) => Some(line),
            LinePosition::Gap(_) => None,
        }
    }

    /// The position `step` lines further along a run. Gaps stay put.
    pub(crate) fn advanced(self, step: u32) -> Self {
        match self {
            LinePosition::Exact(line) => LinePosition::Exact(line.saturating_add(step)),
            LinePosition::Gap(after) => LinePosition::Gap(after),
        }
    }

    /// Editor cursor placement as `(line, column)`.
    ///
    /// A gap becomes an insertion point at the start of the following line.
    /// Exact positions leave the column to the caller.
    pub fn cursor(&self) -> (u32, Option<u32>) {
        match *self {
            LinePosition::Exact(line) => (line, None),
            LinePosition::Gap(after) => (after + 1, Some(1)),
        }
    }
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinePosition::Exact(line) => write!(f, "{}", line),
            LinePosition::Gap(after) => write!(f, "after {}", after),
        }
    }
}

/// Links a position in the old revision to one in the new revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondencePair {
    pub old: LinePosition,
    pub new: LinePosition,
}

impl CorrespondencePair {
    pub fn new(old: LinePosition, new: LinePosition) -> Self {
        Self { old, new }
    }
}

/// `len` consecutive pairs starting at `old` / `new`.
///
/// An exact side moves one line per pair, a gap side repeats the same gap.
/// Long stretches of unchanged lines are kept as one run, so a table's size
/// follows the diff text rather than the line numbers it mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondenceRun {
    pub old: LinePosition,
    pub new: LinePosition,
    pub len: u32,
}

impl CorrespondenceRun {
    pub fn new(old: LinePosition, new: LinePosition, len: u32) -> Self {
        Self { old, new, len }
    }

    /// Both sides are real lines
    pub fn both(old: u32, new: u32, len: u32) -> Self {
        Self::new(LinePosition::Exact(old), LinePosition::Exact(new), len)
    }

    /// Old lines with no counterpart, placed after new line `after`
    pub fn removed(old: u32, after: u32, len: u32) -> Self {
        Self::new(LinePosition::Exact(old), LinePosition::Gap(after), len)
    }

    /// New lines with no counterpart, placed after old line `after`
    pub fn inserted(after: u32, new: u32, len: u32) -> Self {
        Self::new(LinePosition::Gap(after), LinePosition::Exact(new), len)
    }

    /// The run expanded into one pair per line
    pub fn pairs(self) -> impl Iterator<Item = CorrespondencePair> {
        (0..self.len).map(move |step| {
            CorrespondencePair::new(self.old.advanced(step), self.new.advanced(step))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_placement() {
        assert_eq!(LinePosition::Exact(12).cursor(), (12, None));
        assert_eq!(LinePosition::Gap(4).cursor(), (5, Some(1)));
        assert_eq!(LinePosition::Gap(0).cursor(), (1, Some(1)));
    }

    #[test]
    fn test_exact_accessor() {
        assert_eq!(LinePosition::Exact(3).exact(), Some(3));
        assert_eq!(LinePosition::Gap(3).exact(), None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&LinePosition::Gap(2)).unwrap();
        assert_eq!(json, r#"{"kind":"gap","line":2}"#);
        let back: LinePosition = serde_json::from_str(r#"{"kind":"exact","line":9}"#).unwrap();
        assert_eq!(back, LinePosition::Exact(9));
    }

    #[test]
    fn test_display() {
        assert_eq!(LinePosition::Exact(7).to_string(), "7");
        assert_eq!(LinePosition::Gap(7).to_string(), "after 7");
    }

    #[test]
    fn test_run_expands_per_line() {
        let pairs: Vec<_> = CorrespondenceRun::removed(4, 2, 3).pairs().collect();
        assert_eq!(
            pairs,
            vec![
                CorrespondencePair::new(LinePosition::Exact(4), LinePosition::Gap(2)),
                CorrespondencePair::new(LinePosition::Exact(5), LinePosition::Gap(2)),
                CorrespondencePair::new(LinePosition::Exact(6), LinePosition::Gap(2)),
            ]
        );
        assert_eq!(CorrespondenceRun::both(1, 1, 0).pairs().count(), 0);
    }
}
