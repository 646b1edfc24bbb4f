use std::path::PathBuf;

use clap::{Args, Subcommand};
use shark_core::entities::EntityKind;
use shark_core::keys::{EpicKey, FeatureKey, TaskKey};
use shark_storage::repositories::document;

use crate::context::{CmdResult, Context};

#[derive(Subcommand)]
pub enum DocCommands {
    /// Link a Document to an Epic, Feature, or Task.
    Link(LinkArgs),
    /// Remove a Document link (idempotent: unlinking twice is not an error).
    Unlink(LinkArgs),
}

#[derive(Args)]
pub struct LinkArgs {
    /// Which kind of entity `key` identifies.
    #[arg(long, value_enum)]
    kind: EntityKindArg,
    /// The Epic/Feature/Task key to link against.
    key: String,
    /// Document title.
    title: String,
    /// Path to the document file.
    path: PathBuf,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum EntityKindArg {
    Epic,
    Feature,
    Task,
}

impl From<EntityKindArg> for EntityKind {
    fn from(value: EntityKindArg) -> Self {
        match value {
            EntityKindArg::Epic => EntityKind::Epic,
            EntityKindArg::Feature => EntityKind::Feature,
            EntityKindArg::Task => EntityKind::Task,
        }
    }
}

pub fn run(ctx: &Context, cmd: DocCommands) -> CmdResult {
    let config = ctx.load_config()?;
    let storage = ctx.open_storage(&config)?;
    let conn = storage.connection();

    match cmd {
        DocCommands::Link(args) => {
            let doc = document::get_or_create(conn, &args.title, &args.path)?;
            match EntityKind::from(args.kind) {
                EntityKind::Epic => document::link_to_epic(conn, &EpicKey::parse(&args.key)?, doc.id)?,
                EntityKind::Feature => document::link_to_feature(conn, &FeatureKey::parse(&args.key)?, doc.id)?,
                EntityKind::Task => document::link_to_task(conn, &TaskKey::parse(&args.key)?, doc.id)?,
            }
            println!("linked '{}' to {}", args.title, args.key);
        }
        DocCommands::Unlink(args) => {
            let doc = document::get_or_create(conn, &args.title, &args.path)?;
            match EntityKind::from(args.kind) {
                EntityKind::Epic => document::unlink_from_epic(conn, &EpicKey::parse(&args.key)?, doc.id)?,
                EntityKind::Feature => document::unlink_from_feature(conn, &FeatureKey::parse(&args.key)?, doc.id)?,
                EntityKind::Task => document::unlink_from_task(conn, &TaskKey::parse(&args.key)?, doc.id)?,
            }
            println!("unlinked '{}' from {}", args.title, args.key);
        }
    }

    Ok(ctx.exit_success())
}
