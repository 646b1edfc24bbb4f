use clap::{Args, Subcommand};
use shark_core::entities::Feature;
use shark_core::keys::{EpicKey, FeatureKey};
use shark_core::slug::slugify;
use shark_storage::repositories::feature;

use crate::context::{CmdResult, Context};

#[derive(Subcommand)]
pub enum FeatureCommands {
    /// Create a Feature directly in the database (outside sync).
    Create(CreateArgs),
    /// List every Feature, or just those under one Epic.
    List(ListArgs),
    /// Show one Feature by key.
    Show(ShowArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Key, e.g. E01-F01.
    key: String,
    /// Title.
    title: String,
    #[arg(long, default_value = "backlog")]
    status: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Restrict to Features under this Epic.
    #[arg(long)]
    epic: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    key: String,
}

pub fn run(ctx: &Context, cmd: FeatureCommands) -> CmdResult {
    let config = ctx.load_config()?;
    let storage = ctx.open_storage(&config)?;
    let conn = storage.connection();

    match cmd {
        FeatureCommands::Create(args) => {
            let key = FeatureKey::parse(&args.key)?;
            let epic_key = key.epic_key();
            let now = chrono::Utc::now();
            let new_feature = Feature {
                slug: slugify(&args.title),
                key,
                epic_key,
                title: args.title,
                description: None,
                status: args.status,
                priority: None,
                file_path: None,
                created_at: now,
                updated_at: now,
            };
            feature::create(conn, &new_feature)?;
            println!("created {}", new_feature.key);
        }
        FeatureCommands::List(args) => {
            let features = match args.epic {
                Some(raw) => feature::list_for_epic(conn, &EpicKey::parse(&raw)?)?,
                None => feature::list(conn)?,
            };
            for f in features {
                println!("{}  {}  {}", f.key, f.status, f.title);
            }
        }
        FeatureCommands::Show(args) => {
            let key = FeatureKey::parse(&args.key)?;
            match feature::get_by_key(conn, &key)? {
                Some(f) => println!("{}", serde_json::to_string_pretty(&f)?),
                None => {
                    eprintln!("no such feature: {}", args.key);
                    return Ok(ctx.exit_failure());
                }
            }
        }
    }

    Ok(ctx.exit_success())
}
