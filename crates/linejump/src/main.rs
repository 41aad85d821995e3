//! Linejump CLI - open a file at the line that corresponds across revisions

mod config;
mod editor;
mod jump;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use jump::Jump;
use linejump_core::git::{self, DiffRequest};
use linejump_core::{DiffEngine, Direction};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linejump", version, about = "Map line numbers between file revisions")]
struct Cli {
    /// Config file (default: <config dir>/linejump/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Query {
    /// Line number in the source revision
    #[arg(long)]
    line: u32,

    /// Map from the new revision back to the old one
    #[arg(long)]
    reverse: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Query {
    fn direction(&self) -> Direction {
        if self.reverse {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Map a line through an existing unified diff
    Map {
        /// Diff file, or "-" for stdin
        #[arg(long)]
        diff: PathBuf,

        /// File path as it appears in the diff
        #[arg(long)]
        file: String,

        #[command(flatten)]
        query: Query,
    },

    /// Map a line between two files on disk
    DiffFiles {
        old: PathBuf,
        new: PathBuf,

        #[command(flatten)]
        query: Query,
    },

    /// Map a line of a file between two git revisions
    Git {
        /// Any directory inside the repository
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Revision the line number refers to
        #[arg(long)]
        from: String,

        /// Target revision (default: working tree)
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        ignore_whitespace: bool,

        /// Path relative to the repository root
        #[arg(long)]
        file: String,

        #[command(flatten)]
        query: Query,
    },

    /// Open a file in the configured editor, mapping the line from a revision
    /// to the working tree first
    Open {
        /// Repository as owner/name, looked up in the config's roots
        #[arg(long)]
        repo: Option<String>,

        /// Revision the line number refers to
        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        ignore_whitespace: bool,

        /// Path relative to the repository root
        #[arg(long)]
        file: String,

        #[arg(long)]
        line: Option<u32>,

        #[arg(long)]
        column: Option<u32>,
    },
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("LINEJUMP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_jump(jump: &Jump, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(jump)?);
    } else {
        println!("{}", jump.location());
    }
    Ok(())
}

fn read_diff(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read diff from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Map { diff, file, query } => {
            let text = read_diff(&diff)?;
            let jump = jump::resolve(&text, &file, query.line, query.direction());
            print_jump(&jump, query.json)
        }
        Commands::DiffFiles { old, new, query } => {
            let map = DiffEngine::new()
                .with_context(config.context_lines)
                .map_files(&old, &new)
                .context("failed to diff files")?;
            let (target, mapper) = match query.direction() {
                Direction::Forward => (&new, &map.forward),
                Direction::Backward => (&old, &map.backward),
            };
            let jump = match mapper.map(query.line) {
                Some(position) => Jump {
                    path: target.display().to_string(),
                    position,
                    mapped: true,
                },
                None => Jump::unmapped(&target.display().to_string(), query.line),
            };
            print_jump(&jump, query.json)
        }
        Commands::Git {
            repo,
            from,
            to,
            ignore_whitespace,
            file,
            query,
        } => {
            let root = git::repo_root(&repo)
                .with_context(|| format!("{} is not inside a git repository", repo.display()))?;
            let mut request = DiffRequest::new(&file, from)
                .ignore_whitespace(ignore_whitespace || config.ignore_whitespace);
            if let Some(to) = to {
                request = request.to(to);
            }
            let text = git::fetch_diff(&root, &request).context("git diff failed")?;
            let jump = jump::resolve(&text, &file, query.line, query.direction());
            print_jump(&jump, query.json)
        }
        Commands::Open {
            repo,
            from,
            to,
            ignore_whitespace,
            file,
            line,
            column,
        } => {
            let root = config.root_for(repo.as_deref())?;
            let line = line.unwrap_or(1);

            let jump = match from {
                Some(from) => {
                    let mut request = DiffRequest::new(&file, from)
                        .ignore_whitespace(ignore_whitespace || config.ignore_whitespace);
                    if let Some(to) = to {
                        request = request.to(to);
                    }
                    match git::fetch_diff(&root, &request) {
                        Ok(text) => jump::resolve(&text, &file, line, Direction::Forward),
                        Err(err) => {
                            tracing::warn!(%err, "could not fetch diff, opening line {}", line);
                            Jump::unmapped(&file, line)
                        }
                    }
                }
                None => Jump::unmapped(&file, line),
            };

            let (line, gap_column) = jump.position.cursor();
            let column = gap_column.or(column).unwrap_or(1);
            editor::open(&config.editor, &root, &root.join(&jump.path), line, column)
        }
    }
}
