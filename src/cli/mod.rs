// src/cli/mod.rs — CLI definition (clap derive)

pub mod recipe;
pub mod session;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "souschef", about = "Step-by-step cooking timers over Telegram", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default when no subcommand given)
    Run,
    /// Manage stored recipes
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
    /// Show active cooking sessions
    Status {
        /// Show paths and per-session details
        #[arg(long)]
        details: bool,
    },
    /// Cancel a user's cooking session (manual cleanup)
    Cancel {
        /// Telegram user id
        user_id: i64,
    },
}

#[derive(Subcommand, Clone)]
pub enum RecipeAction {
    /// Import a recipe from a TOML or JSON file
    Import {
        /// Path to the recipe file
        path: String,
        /// Owner's Telegram user id
        #[arg(long)]
        user: Option<i64>,
    },
    /// List stored recipes
    List,
}
