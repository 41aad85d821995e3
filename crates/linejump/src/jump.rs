//! Turning a clicked line into a place to open
//!
//! Line mapping only improves where the cursor lands. Any failure here
//! falls back to the original path and line.

use linejump_core::{compute_line_map, Direction, LinePosition};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Jump {
    /// Path in the target revision
    pub path: String,
    pub position: LinePosition,
    /// False when the original line was kept
    pub mapped: bool,
}

impl Jump {
    pub fn unmapped(path: &str, line: u32) -> Self {
        Self {
            path: path.to_string(),
            position: LinePosition::Exact(line),
            mapped: false,
        }
    }

    /// `path:line` or `path:line:column`
    pub fn location(&self) -> String {
        match self.position.cursor() {
            (line, Some(column)) => format!("{}:{}:{}", self.path, line, column),
            (line, None) => format!("{}:{}", self.path, line),
        }
    }
}

/// Map `line` of `path` through `diff_text`
pub fn resolve(diff_text: &str, path: &str, line: u32, direction: Direction) -> Jump {
    let index = match compute_line_map(diff_text) {
        Ok(index) => index,
        Err(err) => {
            tracing::warn!(%err, "could not build line map, keeping line {}", line);
            return Jump::unmapped(path, line);
        }
    };

    let Some(file) = index.file_for(path, direction) else {
        if index.file_for(path, direction.reversed()).is_some() {
            tracing::warn!(
                path,
                ?direction,
                "path only exists on the other side of the diff, keeping line {}",
                line
            );
        } else {
            tracing::debug!(path, "file unchanged between revisions");
        }
        return Jump::unmapped(path, line);
    };

    let target_path = match direction {
        Direction::Forward => file.to_path.as_deref(),
        Direction::Backward => file.from_path.as_deref(),
    }
    .unwrap_or(path);

    match file.mapper(direction).map(line) {
        Some(position) => Jump {
            path: target_path.to_string(),
            position,
            mapped: true,
        },
        None => {
            tracing::warn!(path, line, "no corresponding line, keeping it unchanged");
            Jump::unmapped(target_path, line)
        }
    }
}
