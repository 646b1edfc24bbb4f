use clap::{Parser, Subcommand};

mod context;
mod doc;
mod epic;
mod feature;
mod init;
mod sync;
mod task;
mod validate;

use context::Context;

/// Syncs a Markdown plan tree with a SQLite database of Epics, Features,
/// Tasks, and Documents.
///
/// shark treats `docs/plan/` (or whatever `documentation_root` points at)
/// as the source of truth for titles, status, and descriptions, and keeps
/// a SQLite database in step with it so the rest of your tooling can query
/// structured state instead of parsing Markdown.
///
/// QUICK START:
///
///   shark init
///   shark sync
///   shark task next --status backlog
#[derive(Parser)]
#[command(name = "shark")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit JSON instead of human-readable text (alias for --output json).
    #[arg(long, global = true)]
    json: bool,

    /// Disable color in text output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Increase log verbosity.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the SQLite database file. Overrides `shark.toml`.
    #[arg(long, global = true)]
    db: Option<std::path::PathBuf>,

    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "shark.toml")]
    config: std::path::PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the documentation root and sync it into the database.
    Sync(sync::SyncArgs),

    /// Check the database for integrity problems.
    Validate(validate::ValidateArgs),

    /// Manage Epics directly.
    #[command(subcommand)]
    Epic(epic::EpicCommands),

    /// Manage Features directly.
    #[command(subcommand)]
    Feature(feature::FeatureCommands),

    /// Manage Tasks directly.
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Link or unlink Documents.
    #[command(subcommand)]
    Doc(doc::DocCommands),

    /// Create `shark.toml` and the database in the current directory.
    Init(init::InitArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let ctx = Context { json: cli.json, no_color: cli.no_color, db: cli.db, config_path: cli.config };

    let result = match cli.command {
        Commands::Sync(args) => sync::run(&ctx, args),
        Commands::Validate(args) => validate::run(&ctx, args),
        Commands::Epic(cmd) => epic::run(&ctx, cmd),
        Commands::Feature(cmd) => feature::run(&ctx, cmd),
        Commands::Task(cmd) => task::run(&ctx, cmd),
        Commands::Doc(cmd) => doc::run(&ctx, cmd),
        Commands::Init(args) => init::run(&ctx, args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::ExitCode::from(exit_code::CONFIGURATION_ERROR)
        }
    }
}

/// Exit codes: 0 success, 1 failure or issues found, 2 configuration error.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
    pub const CONFIGURATION_ERROR: u8 = 2;
}
