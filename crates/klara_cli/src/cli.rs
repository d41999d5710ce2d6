use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "klara", author, version, about = "Turn brain dumps into tasks, shopping items and events", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to $KLARA_CONFIG_PATH or ~/.config/klara/klara.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in by email, creating the user on first use
    ///
    /// Example: klara login parent@example.com --first-name Sam
    Login {
        email: String,
        #[arg(long)]
        first_name: Option<String>,
    },
    /// Interpret a brain dump and save what it contains
    ///
    /// Example: klara dump --user parent@example.com "Call the babysitter and buy milk"
    Dump {
        text: String,
        /// Email of a user created with `login`
        #[arg(long)]
        user: String,
        /// Date relative expressions resolve against (YYYY-MM-DD, defaults to today)
        #[arg(long, value_name = "DATE")]
        today: Option<String>,
        /// Show the interpretation without saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// List a user's saved records
    ///
    /// Example: klara list --user parent@example.com
    List {
        #[arg(long)]
        user: String,
    },
    /// Mark a record as completed
    ///
    /// Example: klara complete task 3f0c...
    /// Example: klara complete item 9a1b... --undo
    Complete {
        kind: RecordKind,
        id: String,
        /// Clear the completed flag instead
        #[arg(long)]
        undo: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Task,
    Subtask,
    Item,
}
