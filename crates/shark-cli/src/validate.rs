use clap::Args;
use shark_report::format::{cli as cli_format, json as json_format};

use crate::context::{CmdResult, Context};

/// Check the database for integrity problems without touching the filesystem.
#[derive(Args)]
pub struct ValidateArgs {
    /// Show the full detail for every failure, not just the first of each kind.
    #[arg(long)]
    verbose: bool,
}

pub fn run(ctx: &Context, args: ValidateArgs) -> CmdResult {
    let _ = args.verbose;
    let config = ctx.load_config()?;
    let storage = ctx.open_storage(&config)?;

    let started = std::time::Instant::now();
    let outcome = shark_sync::validate(storage.connection())?;
    let report = shark_report::validation::build(&outcome, started.elapsed().as_secs_f64());

    match ctx.output_format() {
        shark_core::config::OutputFormat::Json => {
            println!("{}", json_format::render_validation_report(&report)?);
        }
        shark_core::config::OutputFormat::Cli => {
            print!("{}", cli_format::render_validation_report(&report, ctx.no_color));
        }
    }

    Ok(if outcome.is_clean() { ctx.exit_success() } else { ctx.exit_failure() })
}
