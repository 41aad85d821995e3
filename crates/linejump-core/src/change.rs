//! Structured representation of a unified diff

use serde::{Deserialize, Serialize};

/// One line of a hunk body, numbered on the side(s) it exists on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// Unchanged line present in both revisions
    Context { old: u32, new: u32 },
    /// Line only present in the old revision
    Deleted { old: u32 },
    /// Line only present in the new revision
    Added { new: u32 },
}

impl Change {
    pub fn context(old: u32, new: u32) -> Self {
        Change::Context { old, new }
    }

    pub fn deleted(old: u32) -> Self {
        Change::Deleted { old }
    }

    pub fn added(new: u32) -> Self {
        Change::Added { new }
    }

    /// Line number in the old revision, if this line exists there
    pub fn old_line(&self) -> Option<u32> {
        match *self {
            Change::Context { old, .. } | Change::Deleted { old } => Some(old),
            Change::Added { .. } => None,
        }
    }

    /// Line number in the new revision, if this line exists there
    pub fn new_line(&self) -> Option<u32> {
        match *self {
            Change::Context { new, .. } | Change::Added { new } => Some(new),
            Change::Deleted { .. } => None,
        }
    }
}

/// A single `@@` hunk of a unified diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffChunk {
    /// Starting line number in the old file, as written in the header
    pub old_start: u32,
    /// Number of old-side lines covered by this chunk
    pub old_lines: u32,
    /// Starting line number in the new file, as written in the header
    pub new_start: u32,
    /// Number of new-side lines covered by this chunk
    pub new_lines: u32,
    /// Body lines in hunk order
    pub changes: Vec<Change>,
}

impl DiffChunk {
    pub fn new(old_start: u32, old_lines: u32, new_start: u32, new_lines: u32) -> Self {
        Self {
            old_start,
            old_lines,
            new_start,
            new_lines,
            changes: Vec::new(),
        }
    }

    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = changes;
        self
    }

    /// First old line inside the chunk.
    ///
    /// A side with zero lines reports the line *before* the chunk as its
    /// start (`@@ -4,0 +5,2 @@` inserts after old line 4), so the chunk
    /// really begins one line later on that side. `None` when that line
    /// number does not fit in a `u32`.
    pub fn old_begin(&self) -> Option<u32> {
        effective_start(self.old_start, self.old_lines)
    }

    /// First new line inside the chunk. See [`DiffChunk::old_begin`].
    pub fn new_begin(&self) -> Option<u32> {
        effective_start(self.new_start, self.new_lines)
    }

    /// First old line after the chunk
    pub fn old_end(&self) -> Option<u32> {
        self.old_begin()?.checked_add(self.old_lines)
    }

    /// First new line after the chunk
    pub fn new_end(&self) -> Option<u32> {
        self.new_begin()?.checked_add(self.new_lines)
    }

    pub fn insertions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, Change::Added { .. }))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, Change::Deleted { .. }))
            .count()
    }
}

fn effective_start(start: u32, lines: u32) -> Option<u32> {
    if lines == 0 {
        start.checked_add(1)
    } else {
        Some(start)
    }
}

/// All chunks touching one file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path in the old revision, `None` for an added file
    pub from_path: Option<String>,
    /// Path in the new revision, `None` for a deleted file
    pub to_path: Option<String>,
    pub chunks: Vec<DiffChunk>,
}

impl FileDiff {
    pub fn new(from_path: Option<String>, to_path: Option<String>) -> Self {
        Self {
            from_path,
            to_path,
            chunks: Vec::new(),
        }
    }

    pub fn is_rename(&self) -> bool {
        matches!((&self.from_path, &self.to_path), (Some(a), Some(b)) if a != b)
    }

    /// Path to show for this file, preferring the new name
    pub fn display_path(&self) -> &str {
        self.to_path
            .as_deref()
            .or(self.from_path.as_deref())
            .unwrap_or("/dev/null")
    }
}
