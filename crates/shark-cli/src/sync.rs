use std::path::PathBuf;

use clap::Args;
use shark_core::config::ConflictStrategy;
use shark_report::format::{cli as cli_format, json as json_format};
use shark_report::Reporter;
use shark_sync::SyncOptions;

use crate::context::{CmdResult, Context};

/// Run the sync engine: scan, parse, detect conflicts, and write changes.
#[derive(Args)]
pub struct SyncArgs {
    /// Scan this folder instead of `documentation_root` from `shark.toml`.
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Compute and report changes without writing to the database.
    #[arg(long)]
    dry_run: bool,

    /// Conflict resolution strategy, overriding the configured default.
    #[arg(long)]
    conflict_strategy: Option<ConflictStrategy>,

    /// Synthesize missing ancestor Epics/Features referenced by a file.
    #[arg(long)]
    create_missing: bool,

    /// Additional include glob, may be repeated.
    #[arg(long = "include")]
    include: Vec<String>,

    /// Additional exclude glob, may be repeated.
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Suppress the per-phase summary; only the final report is printed.
    #[arg(long)]
    quiet: bool,
}

pub fn run(ctx: &Context, args: SyncArgs) -> CmdResult {
    let config = ctx.load_config()?;
    let mut storage = ctx.open_storage(&config)?;

    let options = SyncOptions {
        folder: args.folder,
        dry_run: args.dry_run,
        conflict_strategy: args.conflict_strategy,
        create_missing: args.create_missing,
        include_patterns: args.include,
        exclude_patterns: args.exclude,
        max_file_size: None,
    };

    let outcome = shark_sync::run(&mut storage, &config, &options);
    let reporter = Reporter::from_events(outcome.events.clone());
    let report = reporter.generate_report(&outcome);

    match ctx.output_format() {
        shark_core::config::OutputFormat::Json => {
            println!("{}", json_format::render_scan_report(&report)?);
        }
        shark_core::config::OutputFormat::Cli if args.quiet => {}
        shark_core::config::OutputFormat::Cli => {
            print!("{}", cli_format::render_scan_report(&report, ctx.no_color));
        }
    }

    Ok(match outcome.status {
        shark_core::RunStatus::Success => ctx.exit_success(),
        shark_core::RunStatus::Failure | shark_core::RunStatus::Cancelled => ctx.exit_failure(),
    })
}
