use clap::{Args, Subcommand};
use shark_core::entities::Task;
use shark_core::keys::{FeatureKey, TaskKey};
use shark_storage::repositories::task;

use crate::context::{CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a Task directly in the database (outside sync).
    Create(CreateArgs),
    /// List every Task, or just those under one Feature.
    List(ListArgs),
    /// Show one Task by key.
    Show(ShowArgs),
    /// Return the highest-priority unblocked Task in a given status.
    Next(NextArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Key, e.g. T-E01-F01-001.md.
    key: String,
    /// Title.
    title: String,
    #[arg(long, default_value = "backlog")]
    status: String,
    #[arg(long, default_value_t = 5)]
    priority: u8,
}

#[derive(Args)]
pub struct ListArgs {
    /// Restrict to Tasks under this Feature.
    #[arg(long)]
    feature: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    key: String,
}

#[derive(Args)]
pub struct NextArgs {
    /// Status to search within.
    #[arg(long, default_value = "backlog")]
    status: String,
}

pub fn run(ctx: &Context, cmd: TaskCommands) -> CmdResult {
    let config = ctx.load_config()?;
    let storage = ctx.open_storage(&config)?;
    let conn = storage.connection();

    match cmd {
        TaskCommands::Create(args) => {
            let key = TaskKey::parse(&args.key)?;
            let feature_key = key.feature_key();
            let now = chrono::Utc::now();
            let new_task = Task {
                feature_key,
                key,
                title: args.title,
                description: None,
                status: args.status,
                priority: args.priority,
                assigned_agent: String::new(),
                depends_on: Vec::new(),
                estimated_time: None,
                file_path: None,
                created_at: now,
                updated_at: now,
            };
            task::create(conn, &new_task)?;
            println!("created {}", new_task.key);
        }
        TaskCommands::List(args) => {
            let tasks = match args.feature {
                Some(raw) => task::list_for_feature(conn, &FeatureKey::parse(&raw)?)?,
                None => task::list(conn)?,
            };
            for t in tasks {
                println!("{}  {}  p{}  {}", t.key, t.status, t.priority, t.title);
            }
        }
        TaskCommands::Show(args) => {
            let key = TaskKey::parse(&args.key)?;
            match task::get_by_key(conn, &key)? {
                Some(t) => println!("{}", serde_json::to_string_pretty(&t)?),
                None => {
                    eprintln!("no such task: {}", args.key);
                    return Ok(ctx.exit_failure());
                }
            }
        }
        TaskCommands::Next(args) => match task::next(conn, &args.status)? {
            Some(t) => println!("{}", serde_json::to_string_pretty(&t)?),
            None => {
                println!("no unblocked task in status '{}'", args.status);
                return Ok(ctx.exit_failure());
            }
        },
    }

    Ok(ctx.exit_success())
}
