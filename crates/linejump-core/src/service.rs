//! Entry point: diff text in, per-file line maps out

use crate::change::FileDiff;
use crate::correspondence::build_table;
use crate::error::LineMapError;
use crate::mapper::{Direction, LineMapper};
use crate::patch;
use crate::position::{CorrespondencePair, CorrespondenceRun};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Line maps for one file of a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiffMap {
    pub from_path: Option<String>,
    pub to_path: Option<String>,
    /// The correspondence table, with unchanged stretches kept as runs
    pub runs: Vec<CorrespondenceRun>,
    /// Old revision to new revision
    pub forward: LineMapper,
    /// New revision to old revision
    pub backward: LineMapper,
}

impl FileDiffMap {
    pub fn from_file_diff(file: &FileDiff) -> Result<Self, LineMapError> {
        let table = build_table(&file.chunks).map_err(|err| match err {
            LineMapError::MalformedDiff { line, reason } => LineMapError::MalformedDiff {
                line,
                reason: format!("{}: {}", file.display_path(), reason),
            },
            other => other,
        })?;

        Ok(Self {
            from_path: file.from_path.clone(),
            to_path: file.to_path.clone(),
            forward: LineMapper::forward(&table),
            backward: LineMapper::backward(&table),
            runs: table.runs,
        })
    }

    /// Map for a file that is in the diff without content changes
    pub fn unchanged(from_path: Option<String>, to_path: Option<String>) -> Self {
        Self {
            from_path,
            to_path,
            runs: Vec::new(),
            forward: LineMapper::identity(Direction::Forward),
            backward: LineMapper::identity(Direction::Backward),
        }
    }

    /// Every correspondence pair in order, one per line
    pub fn pairs(&self) -> impl Iterator<Item = CorrespondencePair> + '_ {
        self.runs.iter().flat_map(|run| run.pairs())
    }

    pub fn mapper(&self, direction: Direction) -> &LineMapper {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }
}

/// The mappers registered under one path.
///
/// After a rename the old name only exists in the old revision, so only a
/// forward mapper is found under it; the new name gives only a backward one.
#[derive(Debug, Clone, Copy)]
pub struct FileLineMaps<'a> {
    pub forward: Option<&'a LineMapper>,
    pub backward: Option<&'a LineMapper>,
}

impl<'a> FileLineMaps<'a> {
    pub fn get(&self, direction: Direction) -> Option<&'a LineMapper> {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
        }
    }

    pub fn to_owned_maps(&self) -> OwnedFileLineMaps {
        OwnedFileLineMaps {
            forward: self.forward.cloned(),
            backward: self.backward.cloned(),
        }
    }
}

/// Owned form of [`FileLineMaps`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedFileLineMaps {
    pub forward: Option<LineMapper>,
    pub backward: Option<LineMapper>,
}

/// Every file of one diff, addressable by old and by new path
#[derive(Debug, Clone, Default)]
pub struct LineMapIndex {
    files: Vec<FileDiffMap>,
    by_from: HashMap<String, usize>,
    by_to: HashMap<String, usize>,
}

impl LineMapIndex {
    pub fn new(files: Vec<FileDiffMap>) -> Self {
        let mut by_from = HashMap::new();
        let mut by_to = HashMap::new();
        for (idx, file) in files.iter().enumerate() {
            if let Some(path) = &file.from_path {
                by_from.insert(path.clone(), idx);
            }
            if let Some(path) = &file.to_path {
                by_to.insert(path.clone(), idx);
            }
        }
        Self {
            files,
            by_from,
            by_to,
        }
    }

    /// Forward mapper by old path, backward mapper by new path
    pub fn lookup(&self, path: &str) -> Result<FileLineMaps<'_>, LineMapError> {
        let forward = self
            .file_for(path, Direction::Forward)
            .map(|file| &file.forward);
        let backward = self
            .file_for(path, Direction::Backward)
            .map(|file| &file.backward);
        if forward.is_none() && backward.is_none() {
            return Err(LineMapError::FileNotInDiff(path.to_string()));
        }
        Ok(FileLineMaps { forward, backward })
    }

    /// The file whose source-side name is `path`: its old name when mapping
    /// forward, its new name when mapping backward
    pub fn file_for(&self, path: &str, direction: Direction) -> Option<&FileDiffMap> {
        let index = match direction {
            Direction::Forward => &self.by_from,
            Direction::Backward => &self.by_to,
        };
        index.get(path).map(|&idx| &self.files[idx])
    }

    /// The file registered under `path`, by new path first
    pub fn get(&self, path: &str) -> Option<&FileDiffMap> {
        self.by_to
            .get(path)
            .or_else(|| self.by_from.get(path))
            .map(|&idx| &self.files[idx])
    }

    /// Every file, keyed by both its old and its new path
    pub fn by_path(&self) -> HashMap<&str, &FileDiffMap> {
        let mut map = HashMap::new();
        for (path, &idx) in self.by_from.iter().chain(self.by_to.iter()) {
            map.insert(path.as_str(), &self.files[idx]);
        }
        map
    }

    pub fn files(&self) -> &[FileDiffMap] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Parse a unified diff and build line maps for every file in it
pub fn compute_line_map(diff_text: &str) -> Result<LineMapIndex, LineMapError> {
    let files = patch::parse(diff_text)?
        .iter()
        .map(FileDiffMap::from_file_diff)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(files = files.len(), "computed line maps");
    Ok(LineMapIndex::new(files))
}

/// Line maps for a single path of a diff
pub fn compute_file_line_map(
    diff_text: &str,
    path: &str,
) -> Result<OwnedFileLineMaps, LineMapError> {
    let index = compute_line_map(diff_text)?;
    let maps = index.lookup(path)?.to_owned_maps();
    Ok(maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Change, DiffChunk};
    use crate::position::LinePosition::{Exact, Gap};

    const RENAME_DIFF: &str = "\
diff --git a/src/old.rs b/src/new.rs
similarity index 80%
rename from src/old.rs
rename to src/new.rs
--- a/src/old.rs
+++ b/src/new.rs
@@ -3,3 +3,4 @@
 c
+inserted
 d
 e
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1,2 +1,1 @@
-title
 body
";

    #[test]
    fn test_concrete_scenario() {
        // Old line 2 edited into new line 2, new line 3 inserted after it
        let file = FileDiff {
            from_path: Some("f".into()),
            to_path: Some("f".into()),
            chunks: vec![DiffChunk::new(1, 3, 1, 4).with_changes(vec![
                Change::context(1, 1),
                Change::deleted(2),
                Change::added(2),
                Change::added(3),
                Change::context(4, 4),
            ])],
        };
        let map = FileDiffMap::from_file_diff(&file).unwrap();

        assert_eq!(
            map.pairs().collect::<Vec<_>>(),
            vec![
                CorrespondencePair::new(Exact(1), Exact(1)),
                CorrespondencePair::new(Exact(2), Exact(2)),
                CorrespondencePair::new(Gap(2), Exact(3)),
                CorrespondencePair::new(Exact(4), Exact(4)),
            ]
        );
        assert_eq!(map.forward.map(1), Some(Exact(1)));
        assert_eq!(map.forward.map(2), Some(Exact(2)));
        assert_eq!(map.forward.map(4), Some(Exact(4)));
        assert_eq!(map.backward.map(3), Some(Gap(2)));
    }

    #[test]
    fn test_rename_routes_by_direction() {
        let index = compute_line_map(RENAME_DIFF).unwrap();

        let old = index.lookup("src/old.rs").unwrap();
        assert!(old.backward.is_none());
        let forward = old.forward.unwrap();
        assert_eq!(forward.map(4), Some(Exact(5)));
        assert_eq!(forward.map(2), Some(Exact(2)));

        let new = index.lookup("src/new.rs").unwrap();
        assert!(new.forward.is_none());
        let backward = new.backward.unwrap();
        assert_eq!(backward.map(4), Some(Gap(3)));
        assert_eq!(backward.map(10), Some(Exact(9)));
    }

    #[test]
    fn test_unrenamed_file_has_both_directions() {
        let index = compute_line_map(RENAME_DIFF).unwrap();
        let maps = index.lookup("README.md").unwrap();
        assert_eq!(maps.get(Direction::Forward).unwrap().map(1), Some(Gap(0)));
        assert_eq!(maps.get(Direction::Forward).unwrap().map(2), Some(Exact(1)));
        assert_eq!(maps.get(Direction::Backward).unwrap().map(1), Some(Exact(2)));
    }

    #[test]
    fn test_file_not_in_diff() {
        let index = compute_line_map(RENAME_DIFF).unwrap();
        assert_eq!(
            index.lookup("Cargo.toml").unwrap_err(),
            LineMapError::FileNotInDiff("Cargo.toml".into())
        );
        assert!(compute_file_line_map(RENAME_DIFF, "nope").is_err());
    }

    #[test]
    fn test_pure_rename_is_identity_not_missing() {
        let diff = "\
diff --git a/a.txt b/b.txt
similarity index 100%
rename from a.txt
rename to b.txt
";
        let maps = compute_file_line_map(diff, "a.txt").unwrap();
        assert_eq!(maps.forward.unwrap().map(42), Some(Exact(42)));
        assert!(maps.backward.is_none());
    }

    #[test]
    fn test_by_path_has_both_names() {
        let index = compute_line_map(RENAME_DIFF).unwrap();
        assert_eq!(index.len(), 2);
        let all = index.by_path();
        assert_eq!(all.len(), 3);
        assert!(std::ptr::eq(all["src/old.rs"], all["src/new.rs"]));
        assert_eq!(
            index.get("src/old.rs").unwrap().to_path.as_deref(),
            Some("src/new.rs")
        );
        assert!(index.file_for("src/new.rs", Direction::Forward).is_none());
        assert_eq!(
            index
                .file_for("src/new.rs", Direction::Backward)
                .and_then(|f| f.from_path.as_deref()),
            Some("src/old.rs")
        );
    }

    #[test]
    fn test_empty_diff() {
        let index = compute_line_map("").unwrap();
        assert!(index.is_empty());
        assert!(index.lookup("any").is_err());
    }

    #[test]
    fn test_overlapping_chunks_are_malformed() {
        let diff = "\
--- a/f
+++ b/f
@@ -5,2 +5,2 @@
 a
 b
@@ -4,1 +4,1 @@
 c
";
        let err = compute_line_map(diff).unwrap_err();
        match err {
            LineMapError::MalformedDiff { reason, .. } => assert!(reason.starts_with("f: ")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_past_max_line_is_malformed() {
        for diff in [
            "--- a/f\n+++ b/f\n@@ -4294967295,0 +1 @@\n+x\n",
            "--- a/f\n+++ b/f\n@@ -4294967295,2 +1,2 @@\n a\n b\n",
        ] {
            assert!(matches!(
                compute_line_map(diff),
                Err(LineMapError::MalformedDiff { line: 3, .. })
            ));
        }
    }

    #[test]
    fn test_structured_chunk_past_max_line_is_malformed() {
        let file = FileDiff {
            from_path: Some("f".into()),
            to_path: Some("f".into()),
            chunks: vec![DiffChunk::new(u32::MAX, 0, 1, 1).with_changes(vec![Change::added(1)])],
        };
        let err = FileDiffMap::from_file_diff(&file).unwrap_err();
        match err {
            LineMapError::MalformedDiff { reason, .. } => assert!(reason.starts_with("f: ")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_distant_hunk_builds_few_runs() {
        let diff = "--- a/f\n+++ b/f\n@@ -20000000,1 +20000000,1 @@\n-a\n+b\n";
        let index = compute_line_map(diff).unwrap();
        let map = index.get("f").unwrap();
        assert_eq!(map.runs.len(), 2);
        assert_eq!(map.forward.map(19_999_999), Some(Exact(19_999_999)));
        assert_eq!(map.forward.map(20_000_000), Some(Exact(20_000_000)));
        assert_eq!(map.backward.map(20_000_001), Some(Exact(20_000_001)));
    }

    #[test]
    fn test_unchanged_map_is_identity() {
        let map = FileDiffMap::unchanged(Some("x".into()), Some("x".into()));
        assert_eq!(map.mapper(Direction::Forward).map(9), Some(Exact(9)));
        assert_eq!(map.mapper(Direction::Backward).map(9), Some(Exact(9)));
    }
}
