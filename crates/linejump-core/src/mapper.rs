//! Line lookup in one direction

use crate::correspondence::CorrespondenceTable;
use crate::position::{CorrespondenceRun, LinePosition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which revision a mapper reads line numbers from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Old revision to new revision
    Forward,
    /// New revision to old revision
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Consecutive source lines starting at the segment's key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Segment {
    len: u32,
    /// Where the key line lands; later lines advance from here
    target: LinePosition,
}

/// Maps line numbers of one revision onto positions in the other.
///
/// Lines covered by the diff are looked up in the segment table. Lines past
/// the last chunk are shifted by the diff's net line-count change, since
/// everything after the last hunk is unchanged text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMapper {
    direction: Direction,
    table: BTreeMap<u32, Segment>,
    /// First source line past the last chunk
    extrapolate_from: u32,
    /// Added to source lines at or past `extrapolate_from`
    offset: i64,
}

impl LineMapper {
    /// Old-to-new mapper keyed by the old side's exact lines
    pub fn forward(table: &CorrespondenceTable) -> Self {
        Self::build(
            Direction::Forward,
            &table.runs,
            table.old_end,
            table.new_end,
        )
    }

    /// New-to-old mapper keyed by the new side's exact lines
    pub fn backward(table: &CorrespondenceTable) -> Self {
        Self::build(
            Direction::Backward,
            &table.runs,
            table.new_end,
            table.old_end,
        )
    }

    /// Identity over every positive line, as for a file with no changes
    pub fn identity(direction: Direction) -> Self {
        Self {
            direction,
            table: BTreeMap::new(),
            extrapolate_from: 1,
            offset: 0,
        }
    }

    fn build(
        direction: Direction,
        runs: &[CorrespondenceRun],
        source_end: u32,
        target_end: u32,
    ) -> Self {
        let table = runs
            .iter()
            .filter(|run| run.len > 0)
            .filter_map(|run| {
                let (source, target) = match direction {
                    Direction::Forward => (run.old, run.new),
                    Direction::Backward => (run.new, run.old),
                };
                let segment = Segment {
                    len: run.len,
                    target,
                };
                source.exact().map(|line| (line, segment))
            })
            .collect();

        Self {
            direction,
            table,
            extrapolate_from: source_end,
            offset: i64::from(target_end) - i64::from(source_end),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Net line-count change applied past the diff's coverage
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Map a 1-based line. `None` means there is no derivable answer.
    pub fn map(&self, line: u32) -> Option<LinePosition> {
        if line == 0 {
            return None;
        }
        if let Some((&start, segment)) = self.table.range(..=line).next_back() {
            let step = line - start;
            if step < segment.len {
                return Some(segment.target.advanced(step));
            }
        }
        if line >= self.extrapolate_from {
            let target = i64::from(line) + self.offset;
            return u32::try_from(target)
                .ok()
                .filter(|&t| t > 0)
                .map(LinePosition::Exact);
        }
        None
    }

    /// Map a line, keeping it unchanged when there is no answer
    pub fn map_or_identity(&self, line: u32) -> LinePosition {
        self.map(line).unwrap_or(LinePosition::Exact(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Change, DiffChunk};
    use crate::correspondence::build_table;
    use LinePosition::{Exact, Gap};

    fn mappers(chunks: Vec<DiffChunk>) -> (LineMapper, LineMapper) {
        let table = build_table(&chunks).unwrap();
        (LineMapper::forward(&table), LineMapper::backward(&table))
    }

    #[test]
    fn test_identity_for_context_only_diff() {
        let (fwd, bwd) = mappers(vec![DiffChunk::new(3, 3, 3, 3).with_changes(vec![
            Change::context(3, 3),
            Change::context(4, 4),
            Change::context(5, 5),
        ])]);
        for n in 1..40 {
            assert_eq!(fwd.map(n), Some(Exact(n)));
            assert_eq!(bwd.map(n), Some(Exact(n)));
        }
    }

    #[test]
    fn test_no_chunks_is_identity() {
        let (fwd, bwd) = mappers(vec![]);
        assert_eq!(fwd.map(1), Some(Exact(1)));
        assert_eq!(fwd.map(1000), Some(Exact(1000)));
        assert_eq!(bwd.map(77), Some(Exact(77)));
        assert_eq!(fwd, LineMapper::identity(Direction::Forward));
    }

    #[test]
    fn test_line_zero_is_not_found() {
        let (fwd, bwd) = mappers(vec![]);
        assert_eq!(fwd.map(0), None);
        assert_eq!(bwd.map(0), None);
        assert_eq!(fwd.map_or_identity(0), Exact(0));
    }

    #[test]
    fn test_pure_insertion() {
        // New line 5 inserted after old line 4
        let (fwd, bwd) = mappers(vec![DiffChunk::new(4, 2, 4, 3).with_changes(vec![
            Change::context(4, 4),
            Change::added(5),
            Change::context(5, 6),
        ])]);
        assert_eq!(bwd.map(5), Some(Gap(4)));
        assert_eq!(bwd.map(6), Some(Exact(5)));
        for m in 7..30 {
            assert_eq!(bwd.map(m), Some(Exact(m - 1)));
        }
        assert_eq!(fwd.map(4), Some(Exact(4)));
        assert_eq!(fwd.map(5), Some(Exact(6)));
        assert_eq!(fwd.map(20), Some(Exact(21)));
        assert_eq!(bwd.offset(), -1);
    }

    #[test]
    fn test_pure_deletion() {
        let (fwd, bwd) = mappers(vec![DiffChunk::new(2, 3, 2, 2).with_changes(vec![
            Change::context(2, 2),
            Change::deleted(3),
            Change::context(4, 3),
        ])]);
        assert_eq!(fwd.map(3), Some(Gap(2)));
        assert_eq!(fwd.map(4), Some(Exact(3)));
        for m in 5..30 {
            assert_eq!(fwd.map(m), Some(Exact(m - 1)));
        }
        assert_eq!(bwd.map(2), Some(Exact(2)));
        assert_eq!(bwd.map(3), Some(Exact(4)));
    }

    #[test]
    fn test_substitution_maps_both_ways() {
        let (fwd, bwd) = mappers(vec![DiffChunk::new(9, 3, 9, 3).with_changes(vec![
            Change::context(9, 9),
            Change::deleted(10),
            Change::added(10),
            Change::context(11, 11),
        ])]);
        assert_eq!(fwd.map(10), Some(Exact(10)));
        assert_eq!(bwd.map(10), Some(Exact(10)));
    }

    #[test]
    fn test_extrapolation_with_net_delta() {
        let (fwd, bwd) = mappers(vec![
            DiffChunk::new(1, 2, 1, 3).with_changes(vec![
                Change::context(1, 1),
                Change::added(2),
                Change::context(2, 3),
            ]),
            DiffChunk::new(10, 1, 11, 2)
                .with_changes(vec![Change::context(10, 11), Change::added(12)]),
        ]);
        for n in 11..50 {
            assert_eq!(fwd.map(n), Some(Exact(n + 2)));
        }
        for m in 13..50 {
            assert_eq!(bwd.map(m), Some(Exact(m - 2)));
        }
        // Between chunks the filled gap carries the first chunk's shift
        assert_eq!(fwd.map(5), Some(Exact(6)));
        assert_eq!(bwd.map(6), Some(Exact(5)));
    }

    #[test]
    fn test_deleted_file_maps_to_gap_before_start() {
        let (fwd, _) = mappers(vec![DiffChunk::new(1, 2, 0, 0)
            .with_changes(vec![Change::deleted(1), Change::deleted(2)])]);
        assert_eq!(fwd.map(1), Some(Gap(0)));
        assert_eq!(fwd.map(2), Some(Gap(0)));
        // Shifted by the net change of -2
        assert_eq!(fwd.map(3), Some(Exact(1)));
    }

    #[test]
    fn test_gap_in_structured_input_is_not_found() {
        // A chunk whose body skips old line 2
        let (fwd, _) = mappers(vec![DiffChunk::new(1, 3, 1, 3)
            .with_changes(vec![Change::context(1, 1), Change::context(3, 3)])]);
        assert_eq!(fwd.map(2), None);
        assert_eq!(fwd.map_or_identity(2), Exact(2));
    }

    #[test]
    fn test_direction_reversed() {
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
        assert_eq!(
            LineMapper::identity(Direction::Backward).direction(),
            Direction::Backward
        );
    }

    #[test]
    fn test_distant_chunk_maps_through_one_run() {
        let chunk = DiffChunk::new(20_000_000, 1, 20_000_000, 2).with_changes(vec![
            Change::deleted(20_000_000),
            Change::added(20_000_000),
            Change::added(20_000_001),
        ]);
        let (fwd, bwd) = mappers(vec![chunk]);
        assert_eq!(fwd.map(1), Some(Exact(1)));
        assert_eq!(fwd.map(12_345_678), Some(Exact(12_345_678)));
        assert_eq!(fwd.map(20_000_000), Some(Exact(20_000_000)));
        assert_eq!(fwd.map(20_000_001), Some(Exact(20_000_002)));
        assert_eq!(bwd.map(19_999_999), Some(Exact(19_999_999)));
        assert_eq!(bwd.map(20_000_001), Some(Gap(20_000_000)));
        assert_eq!(bwd.map(20_000_002), Some(Exact(20_000_001)));
    }

    #[test]
    fn test_gap_run_repeats_gap() {
        // Structured input with a gap before the first chunk on the old side
        // only: old lines 1..=3 have no new counterpart
        let chunk = DiffChunk::new(4, 1, 1, 1).with_changes(vec![Change::context(4, 1)]);
        let (fwd, bwd) = mappers(vec![chunk]);
        assert_eq!(fwd.map(1), Some(Gap(0)));
        assert_eq!(fwd.map(3), Some(Gap(0)));
        assert_eq!(fwd.map(4), Some(Exact(1)));
        assert_eq!(bwd.map(1), Some(Exact(4)));
        assert_eq!(bwd.map(2), Some(Exact(5)));
    }
}
