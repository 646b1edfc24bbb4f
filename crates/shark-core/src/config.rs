//! `shark.toml` — the single configuration value constructed once at CLI
//! start-up and threaded by value into the engine and formatters. No
//! global mutable state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default maximum file size the Scanner will read.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Top-level `shark.toml` configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root under which `shark sync` scans for Markdown files. Relative
    /// paths are resolved against the directory containing `shark.toml`.
    pub documentation_root: PathBuf,
    /// Path to the SQLite database file.
    pub database_path: PathBuf,
    pub scanner: ScannerConfig,
    pub workflow: WorkflowConfig,
    /// Default conflict resolution strategy, overridable per-invocation
    /// with `--conflict-strategy`.
    pub default_conflict_strategy: ConflictStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            documentation_root: PathBuf::from("docs/plan"),
            database_path: PathBuf::from(".shark/shark.db"),
            scanner: ScannerConfig::default(),
            workflow: WorkflowConfig::default(),
            default_conflict_strategy: ConflictStrategy::Abort,
        }
    }
}

impl Config {
    /// Load `shark.toml` from `path`, or fall back to defaults if it does
    /// not exist (missing config is not a configuration error — only a
    /// present-but-unparseable one is).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::UnreadableConfig {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::UnreadableConfig {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve `documentation_root` to an absolute path relative to
    /// `config_dir` (the directory `shark.toml` lives in).
    pub fn resolved_documentation_root(&self, config_dir: &Path) -> PathBuf {
        if self.documentation_root.is_absolute() {
            self.documentation_root.clone()
        } else {
            config_dir.join(&self.documentation_root)
        }
    }

    pub fn resolved_database_path(&self, config_dir: &Path) -> PathBuf {
        if self.database_path.is_absolute() {
            self.database_path.clone()
        } else {
            config_dir.join(&self.database_path)
        }
    }
}

/// Scanner-specific defaults, overridable per-invocation: `include_patterns`,
/// `exclude_patterns`, `max_file_size`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    pub max_file_size: u64,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub follow_symlinks: bool,
    pub honor_gitignore: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include: Vec::new(),
            exclude: Vec::new(),
            follow_symlinks: true,
            honor_gitignore: false,
        }
    }
}

/// The set of legal status values and allowed transitions for Features and
/// Tasks. A frontmatter `status` outside `statuses` is a
/// `validation_warning`, never an error, and never mutates the database row
/// (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    pub statuses: Vec<String>,
    /// `from -> [allowed to]`. Empty means "no transition restrictions are
    /// enforced" — the sync engine never drives transitions itself, only
    /// CRUD status-change commands would consult this, which is why an
    /// empty map is a legitimate default for a sync-only workspace.
    pub transitions: std::collections::BTreeMap<String, Vec<String>>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            statuses: vec![
                "backlog".to_string(),
                "in_progress".to_string(),
                "blocked".to_string(),
                "in_review".to_string(),
                "done".to_string(),
            ],
            transitions: std::collections::BTreeMap::new(),
        }
    }
}

impl WorkflowConfig {
    pub fn is_legal_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }
}

/// How the SyncEngine resolves a `conflict` pending change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    PreferFile,
    PreferDb,
    Abort,
}

impl std::str::FromStr for ConflictStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefer_file" => Ok(Self::PreferFile),
            "prefer_db" => Ok(Self::PreferDb),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::UnknownConflictStrategy {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConflictStrategy::PreferFile => "prefer_file",
            ConflictStrategy::PreferDb => "prefer_db",
            ConflictStrategy::Abort => "abort",
        };
        f.write_str(s)
    }
}

/// Output format selection, set via `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Cli,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cli" => Ok(Self::Cli),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnknownOutputFormat {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let rendered = toml::to_string(&cfg).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("shark.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn conflict_strategy_parses() {
        assert_eq!(
            "prefer_file".parse::<ConflictStrategy>().unwrap(),
            ConflictStrategy::PreferFile
        );
        assert!("bogus".parse::<ConflictStrategy>().is_err());
    }

    #[test]
    fn workflow_config_checks_legality() {
        let wf = WorkflowConfig::default();
        assert!(wf.is_legal_status("done"));
        assert!(!wf.is_legal_status("archived"));
    }
}
