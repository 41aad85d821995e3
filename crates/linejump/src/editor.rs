//! Editor launching

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// A fully substituted editor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Fill in the editor template. The template is split on whitespace before
/// substitution, so a path with spaces stays a single argument.
pub fn build_command(
    template: &str,
    root: &Path,
    file: &Path,
    line: u32,
    column: u32,
) -> Result<EditorCommand> {
    let root = root.to_string_lossy();
    let file = file.to_string_lossy();
    let line = line.to_string();
    let column = column.to_string();

    let mut parts = template.split_whitespace().map(|part| {
        part.replace("{root}", &root)
            .replace("{file}", &file)
            .replace("{line}", &line)
            .replace("{column}", &column)
    });

    let Some(program) = parts.next() else {
        bail!("editor command is empty");
    };
    Ok(EditorCommand {
        program,
        args: parts.collect(),
    })
}

/// Open `file` (inside `root`) at the given position
pub fn open(template: &str, root: &Path, file: &Path, line: u32, column: u32) -> Result<()> {
    if !file.exists() {
        bail!("File \"{}\" not found", file.display());
    }

    let command = build_command(template, root, file, line, column)?;
    tracing::info!(program = %command.program, args = ?command.args, "launching editor");

    let status = Command::new(&command.program)
        .args(&command.args)
        .current_dir(root)
        .status()
        .with_context(|| format!("failed to launch {}", command.program))?;

    if !status.success() {
        bail!("{} exited with {}", command.program, status);
    }
    Ok(())
}
