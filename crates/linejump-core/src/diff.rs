//! Unified diff generation for texts that are not in version control

use crate::error::LineMapError;
use crate::patch;
use crate::service::FileDiffMap;
use similar::TextDiff;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Line map construction failed: {0}")]
    LineMap(#[from] LineMapError),
}

/// Produces `diff -u` style text from two in-memory texts
pub struct DiffEngine {
    /// Number of context lines around each hunk
    context_lines: usize,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Unified diff between two strings, labelled with the given paths
    pub fn diff_strings(&self, old_label: &str, new_label: &str, old: &str, new: &str) -> String {
        let text_diff = TextDiff::from_lines(old, new);
        let mut unified = text_diff.unified_diff();
        unified
            .context_radius(self.context_lines)
            .header(old_label, new_label);
        unified.to_string()
    }

    /// Diff two strings and build the line map between them
    pub fn map_strings(&self, old: &str, new: &str) -> Result<FileDiffMap, LineMapError> {
        let text = self.diff_strings("a", "b", old, new);
        let files = patch::parse(&text)?;
        match files.first() {
            Some(file) => FileDiffMap::from_file_diff(file),
            // Identical inputs produce no file section at all
            None => Ok(FileDiffMap::unchanged(Some("a".into()), Some("b".into()))),
        }
    }

    /// Build the line map between two files on disk
    pub fn map_files(&self, old_path: &Path, new_path: &Path) -> Result<FileDiffMap, DiffError> {
        let old_content = std::fs::read_to_string(old_path)?;
        let new_content = std::fs::read_to_string(new_path)?;

        Ok(self.map_strings(&old_content, &new_content)?)
    }
}
