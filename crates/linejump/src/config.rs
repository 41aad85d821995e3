use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// User configuration, read from `<config dir>/linejump/config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor command template. `{file}`, `{line}`, `{column}` and `{root}`
    /// are substituted per argument.
    pub editor: String,

    /// Checkout used when no repository is named
    pub default_root: PathBuf,

    /// Pass `-w` to git diff
    pub ignore_whitespace: bool,

    /// Context lines for `diff-files`
    pub context_lines: usize,

    /// Checkouts by owner, then repository name
    pub roots: BTreeMap<String, BTreeMap<String, PathBuf>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: "nano +{line},{column} {file}".to_string(),
            default_root: PathBuf::from("."),
            ignore_whitespace: false,
            context_lines: 3,
            roots: BTreeMap::new(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("linejump").join("config.toml"))
}

impl Config {
    /// Load from an explicit path, or from the default location. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Checkout for an `owner/name` repository, or the default root
    pub fn root_for(&self, repo: Option<&str>) -> Result<PathBuf> {
        let Some(repo) = repo else {
            return Ok(expand_home(&self.default_root));
        };
        let (owner, name) = repo
            .split_once('/')
            .with_context(|| format!("repository \"{}\" is not of the form owner/name", repo))?;
        let Some(repos) = self.roots.get(owner) else {
            bail!("repository owner \"{}\" not found in config", owner);
        };
        let Some(root) = repos.get(name) else {
            bail!("repository \"{}\" of owner \"{}\" not found in config", name, owner);
        };
        Ok(expand_home(root))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
