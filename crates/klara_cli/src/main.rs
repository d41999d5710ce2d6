//! `klara` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the record store.
//! - Map subcommands onto core services and print plain or JSON output.

mod cli;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::Parser;
use cli::{Cli, Command, RecordKind};
use klara_core::config::{load_config, KlaraConfig};
use klara_core::db::open_db;
use klara_core::model::datetime::{format_date, format_time, parse_date};
use klara_core::model::record::{PersistedBrainDump, User};
use klara_core::pipeline::orchestrator::{BrainDumpOrchestrator, OrchestrationResult};
use klara_core::repo::user_repo::SqliteUserRepository;
use klara_core::service::brain_dump_service::{BrainDumpInput, BrainDumpService};
use klara_core::service::record_service::RecordService;
use klara_core::service::user_service::UserService;
use rusqlite::Connection;
use std::path::PathBuf;
use uuid::Uuid;

const CLI_LOG_LEVEL: &str = "warn";
const DB_FILE_NAME: &str = "klara.db";

fn db_path(config: &KlaraConfig) -> PathBuf {
    if let Some(path) = &config.storage.db_path {
        return path.clone();
    }
    std::env::var_os("HOME")
        .map(|home| {
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("klara")
                .join(DB_FILE_NAME)
        })
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

fn open_store(config: &KlaraConfig) -> anyhow::Result<Connection> {
    let path = db_path(config);
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    open_db(&path).with_context(|| format!("failed to open record store `{}`", path.display()))
}

fn require_user(conn: &Connection, email: &str) -> anyhow::Result<User> {
    UserService::new(SqliteUserRepository::new(conn))
        .find_by_email(email)?
        .ok_or_else(|| anyhow!("no user `{email}`; run `klara login {email}` first"))
}

fn parse_today(value: Option<&str>) -> anyhow::Result<NaiveDate> {
    match value {
        Some(text) => parse_date(text).ok_or_else(|| anyhow!("invalid date `{text}`, expected YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn parse_id(value: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| anyhow!("invalid record id `{value}`"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_records_plain(records: &PersistedBrainDump) {
    for task in &records.tasks {
        let mark = if task.completed { "x" } else { " " };
        let due = task.due_date.map(format_date).unwrap_or_else(|| "-".to_string());
        let minutes = task
            .estimated_minutes
            .map(|minutes| format!("{minutes}m"))
            .unwrap_or_else(|| "-".to_string());
        println!("[{mark}] task {} | {} | due {} | {}", task.id, task.description, due, minutes);
        for subtask in &task.subtasks {
            let mark = if subtask.completed { "x" } else { " " };
            println!(
                "    [{mark}] {}. {} ({})",
                subtask.order, subtask.description, subtask.id
            );
        }
    }
    for item in &records.shopping_items {
        let mark = if item.completed { "x" } else { " " };
        println!("[{mark}] item {} | {}", item.id, item.description);
    }
    for event in &records.calendar_events {
        let time = event.event_time.map(format_time).unwrap_or_else(|| "--:--".to_string());
        println!(
            "event {} | {} | {} {}",
            event.id,
            event.description,
            format_date(event.event_date),
            time
        );
    }
}

fn print_result_plain(result: &OrchestrationResult) {
    if let Some(kind) = result.degraded {
        println!("Could not interpret the brain dump ({}); saved it as a task.", kind.code());
    }
    let extraction = &result.extraction;
    for task in &extraction.tasks {
        println!("task: {} ({}m)", task.description, task.estimated_minutes);
        for subtask in &task.subtasks {
            println!("    {}. {}", subtask.order, subtask.description);
        }
    }
    for item in &extraction.shopping_items {
        println!("item: {}", item.description);
    }
    for event in &extraction.calendar_events {
        let time = event.event_time.map(format_time).unwrap_or_default();
        println!("event: {} on {} {}", event.description, format_date(event.event_date), time);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    let level = config.logging.level.as_deref().unwrap_or(CLI_LOG_LEVEL);
    klara_core::init_logging(level, config.logging.dir.as_deref())
        .map_err(|err| anyhow!("failed to start logging: {err}"))?;

    let conn = open_store(&config)?;

    match cli.command {
        Command::Login { email, first_name } => {
            let user = UserService::new(SqliteUserRepository::new(&conn))
                .login(&email, first_name.as_deref())?;
            if cli.json {
                print_json(&user)?;
            } else {
                println!("Logged in: {} ({})", user.email, user.id);
            }
        }
        Command::Dump {
            text,
            user,
            today,
            dry_run,
        } => {
            let user = require_user(&conn, &user)?;
            let current_date = parse_today(today.as_deref())?;
            let orchestrator = BrainDumpOrchestrator::from_config(&config.inference, &config.pipeline)
                .context("failed to set up inference")?;
            let service = BrainDumpService::new(&conn, &orchestrator);
            let input = BrainDumpInput {
                text,
                user_id: user.id,
            };

            if dry_run {
                let result = service.preview(&input, current_date).await?;
                if cli.json {
                    print_json(&result)?;
                } else {
                    print_result_plain(&result);
                }
            } else {
                let outcome = service.submit(&input, current_date).await?;
                if cli.json {
                    print_json(&outcome)?;
                } else {
                    print_result_plain(&outcome.result);
                    println!(
                        "Saved {} task(s), {} item(s), {} event(s).",
                        outcome.persisted.tasks.len(),
                        outcome.persisted.shopping_items.len(),
                        outcome.persisted.calendar_events.len()
                    );
                }
            }
        }
        Command::List { user } => {
            let user = require_user(&conn, &user)?;
            let records = RecordService::new(&conn).list_for_user(user.id)?;
            if cli.json {
                print_json(&records)?;
            } else {
                print_records_plain(&records);
            }
        }
        Command::Complete { kind, id, undo } => {
            let id = parse_id(&id)?;
            let service = RecordService::new(&conn);
            let completed = !undo;
            match kind {
                RecordKind::Task => service.set_task_completed(id, completed)?,
                RecordKind::Subtask => service.set_subtask_completed(id, completed)?,
                RecordKind::Item => service.set_shopping_item_completed(id, completed)?,
            }
            if cli.json {
                print_json(&serde_json::json!({"id": id, "completed": completed}))?;
            } else if completed {
                println!("Completed: {id}");
            } else {
                println!("Reopened: {id}");
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("ERROR: failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(cli)) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}
