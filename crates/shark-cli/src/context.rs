use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use shark_core::config::{Config, OutputFormat};
use shark_storage::Storage;

use crate::exit_code;

pub type CmdResult = Result<ExitCode>;

/// Global flags threaded into every subcommand. Constructed once in `main`
/// and passed by value — no global mutable state.
pub struct Context {
    pub json: bool,
    pub no_color: bool,
    pub db: Option<PathBuf>,
    pub config_path: PathBuf,
}

impl Context {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Cli
        }
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config_path).context("loading shark.toml")?;
        if let Some(db) = &self.db {
            config.database_path = db.clone();
        }
        Ok(config)
    }

    pub fn open_storage(&self, config: &Config) -> Result<Storage> {
        Storage::open(&config.database_path)
            .with_context(|| format!("opening database at {}", config.database_path.display()))
    }

    pub fn exit_success(&self) -> ExitCode {
        ExitCode::from(exit_code::SUCCESS)
    }

    pub fn exit_failure(&self) -> ExitCode {
        ExitCode::from(exit_code::FAILURE)
    }
}
