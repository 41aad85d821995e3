//! Unified diff parser
//!
//! Turns `git diff` / `diff -u` output into [`FileDiff`]s. Handles:
//! - `diff --git a/... b/...` file boundaries, and bare `---`/`+++` pairs
//!   for multi-file `diff -u` output
//! - `rename from` / `rename to`, `new file mode`, `deleted file mode`
//! - `/dev/null` sides and `a/` / `b/` prefixes
//! - hunk headers with omitted counts (`@@ -3 +3 @@` means one line)
//! - `\ No newline at end of file` markers
//!
//! Hunk bodies are consumed by the counts in their header, so a removed line
//! that happens to start with `-- ` is never mistaken for a file header.

use crate::change::{Change, DiffChunk, FileDiff};
use crate::error::LineMapError;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static HUNK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hardcoded hunk regex")
});

/// Parse a unified diff into per-file chunk lists, in input order
pub fn parse(input: &str) -> Result<Vec<FileDiff>, LineMapError> {
    let input = if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    };

    let lines: Vec<&str> = input.lines().collect();
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut idx = 0;

    while idx < lines.len() {
        let line = lines[idx];
        let line_no = idx + 1;
        idx += 1;

        if let Some(rest) = line.strip_prefix("diff --git ") {
            files.extend(current.take());
            let (from, to) = split_git_header(rest);
            current = Some(FileDiff::new(from, to));
        } else if let Some(path) = line.strip_prefix("--- ") {
            let starts_new = current.as_ref().map_or(true, |f| !f.chunks.is_empty());
            if starts_new {
                files.extend(current.take());
                current = Some(FileDiff::default());
            }
            if let Some(file) = current.as_mut() {
                file.from_path = header_path(path, "a/");
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            let file = current.as_mut().ok_or_else(|| {
                LineMapError::malformed(line_no, "'+++' header without a preceding '---'")
            })?;
            file.to_path = header_path(path, "b/");
        } else if let Some(path) = line.strip_prefix("rename from ") {
            if let Some(file) = current.as_mut() {
                file.from_path = Some(unquote(path).to_string());
            }
        } else if let Some(path) = line.strip_prefix("rename to ") {
            if let Some(file) = current.as_mut() {
                file.to_path = Some(unquote(path).to_string());
            }
        } else if line.starts_with("new file mode") {
            if let Some(file) = current.as_mut() {
                file.from_path = None;
            }
        } else if line.starts_with("deleted file mode") {
            if let Some(file) = current.as_mut() {
                file.to_path = None;
            }
        } else if line.starts_with("@@") {
            let file = current.as_mut().ok_or_else(|| {
                LineMapError::malformed(line_no, "hunk header before any file header")
            })?;
            let mut chunk = parse_hunk_header(line, line_no)?;
            idx = parse_hunk_body(&lines, idx, &mut chunk)?;
            file.chunks.push(chunk);
        } else if line.starts_with("Binary files ") {
            tracing::debug!(line = line_no, "skipping binary file section");
        }
    }
    files.extend(current);

    Ok(files)
}

/// Parse `@@ -a[,b] +c[,d] @@`; an omitted count is 1
pub fn parse_hunk_header(line: &str, line_no: usize) -> Result<DiffChunk, LineMapError> {
    let caps = HUNK_RE
        .captures(line)
        .ok_or_else(|| LineMapError::malformed(line_no, format!("bad hunk header '{}'", line)))?;

    let number = |group: usize, default: u32| -> Result<u32, LineMapError> {
        match caps.get(group) {
            Some(m) => m.as_str().parse().map_err(|_| {
                LineMapError::malformed(line_no, format!("number out of range in '{}'", line))
            }),
            None => Ok(default),
        }
    };

    let chunk = DiffChunk::new(
        number(1, 0)?,
        number(2, 1)?,
        number(3, 0)?,
        number(4, 1)?,
    );
    if chunk.old_end().is_none() || chunk.new_end().is_none() {
        return Err(LineMapError::malformed(
            line_no,
            format!("hunk runs past the largest line number in '{}'", line),
        ));
    }
    Ok(chunk)
}

/// Read body lines until the header's counts are used up. Returns the index
/// of the first line after the hunk.
fn parse_hunk_body(
    lines: &[&str],
    mut idx: usize,
    chunk: &mut DiffChunk,
) -> Result<usize, LineMapError> {
    let (Some(mut old_line), Some(mut new_line)) = (chunk.old_begin(), chunk.new_begin()) else {
        return Err(LineMapError::malformed(idx, "hunk start out of range"));
    };
    let mut old_left = chunk.old_lines;
    let mut new_left = chunk.new_lines;

    while old_left > 0 || new_left > 0 {
        let Some(line) = lines.get(idx) else {
            return Err(LineMapError::malformed(
                lines.len(),
                format!(
                    "hunk ends early: {} old and {} new lines missing",
                    old_left, new_left
                ),
            ));
        };
        let line_no = idx + 1;
        idx += 1;

        // Some tools strip the single space from empty context lines
        let marker = line.chars().next().unwrap_or(' ');
        match marker {
            ' ' => {
                if old_left == 0 || new_left == 0 {
                    return Err(LineMapError::malformed(
                        line_no,
                        "context line exceeds hunk length",
                    ));
                }
                chunk.changes.push(Change::context(old_line, new_line));
                old_line += 1;
                new_line += 1;
                old_left -= 1;
                new_left -= 1;
            }
            '-' => {
                if old_left == 0 {
                    return Err(LineMapError::malformed(
                        line_no,
                        "removed line exceeds hunk length",
                    ));
                }
                chunk.changes.push(Change::deleted(old_line));
                old_line += 1;
                old_left -= 1;
            }
            '+' => {
                if new_left == 0 {
                    return Err(LineMapError::malformed(
                        line_no,
                        "added line exceeds hunk length",
                    ));
                }
                chunk.changes.push(Change::added(new_line));
                new_line += 1;
                new_left -= 1;
            }
            '\\' => {}
            _ => {
                return Err(LineMapError::malformed(
                    line_no,
                    format!(
                        "unexpected line in hunk: {} old and {} new lines missing",
                        old_left, new_left
                    ),
                ));
            }
        }
    }

    Ok(idx)
}

fn split_git_header(rest: &str) -> (Option<String>, Option<String>) {
    match rest.rsplit_once(" b/") {
        Some((from, to)) => (
            Some(from.strip_prefix("a/").unwrap_or(from).to_string()),
            Some(to.to_string()),
        ),
        None => (None, None),
    }
}

/// Path from a `---`/`+++` line, without timestamp or prefix
fn header_path(raw: &str, prefix: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or(raw).trim_end();
    let path = unquote(path);
    if path == "/dev/null" {
        return None;
    }
    Some(path.strip_prefix(prefix).unwrap_or(path).to_string())
}

fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}
