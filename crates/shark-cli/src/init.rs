use clap::Args;
use shark_core::config::Config;

use crate::context::{CmdResult, Context};

/// Create `shark.toml` and the database/schema in the current directory.
///
/// Safe to run more than once: an existing `shark.toml` is left untouched,
/// and opening the database applies only the migrations it is missing.
#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing `shark.toml` with defaults.
    #[arg(long)]
    force: bool,
}

pub fn run(ctx: &Context, args: InitArgs) -> CmdResult {
    if !ctx.config_path.exists() || args.force {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config)?;
        std::fs::write(&ctx.config_path, rendered)?;
        println!("wrote {}", ctx.config_path.display());
    } else {
        println!("{} already exists, leaving it alone", ctx.config_path.display());
    }

    let config = ctx.load_config()?;
    let storage = ctx.open_storage(&config)?;
    println!("database ready at {}", storage.path().map(|p| p.display().to_string()).unwrap_or_default());

    Ok(ctx.exit_success())
}
