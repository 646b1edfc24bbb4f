use clap::{Args, Subcommand};
use shark_core::entities::Epic;
use shark_core::keys::EpicKey;
use shark_core::slug::slugify;
use shark_storage::repositories::epic;

use crate::context::{CmdResult, Context};

#[derive(Subcommand)]
pub enum EpicCommands {
    /// Create an Epic directly in the database (outside sync).
    Create(CreateArgs),
    /// List every Epic.
    List,
    /// Show one Epic by key.
    Show(ShowArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Key, e.g. E01.
    key: String,
    /// Title.
    title: String,
    #[arg(long, default_value = "backlog")]
    status: String,
}

#[derive(Args)]
pub struct ShowArgs {
    key: String,
}

pub fn run(ctx: &Context, cmd: EpicCommands) -> CmdResult {
    let config = ctx.load_config()?;
    let storage = ctx.open_storage(&config)?;
    let conn = storage.connection();

    match cmd {
        EpicCommands::Create(args) => {
            let key = EpicKey::parse(&args.key)?;
            let now = chrono::Utc::now();
            let new_epic = Epic {
                slug: slugify(&args.title),
                key,
                title: args.title,
                description: None,
                status: args.status,
                priority: None,
                business_value: None,
                file_path: None,
                created_at: now,
                updated_at: now,
            };
            epic::create(conn, &new_epic)?;
            println!("created {}", new_epic.key);
        }
        EpicCommands::List => {
            for e in epic::list(conn)? {
                println!("{}  {}  {}", e.key, e.status, e.title);
            }
        }
        EpicCommands::Show(args) => {
            let key = EpicKey::parse(&args.key)?;
            match epic::get_by_key(conn, &key)? {
                Some(e) => println!("{}", serde_json::to_string_pretty(&e)?),
                None => {
                    eprintln!("no such epic: {}", args.key);
                    return Ok(ctx.exit_failure());
                }
            }
        }
    }

    Ok(ctx.exit_success())
}
