// src/main.rs — SousChef entry point

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use mockable::DefaultClock;

use souschef::bot::{self, Dispatcher};
use souschef::cli::{Cli, Commands, RecipeAction};
use souschef::cooking::{CookingEngine, SessionController};
use souschef::infra::config::Config;
use souschef::infra::errors::SousChefError;
use souschef::infra::{logger, paths};
use souschef::integrations::TelegramAdapter;
use souschef::storage;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(Path::new(path))?
    } else {
        Config::load()?
    };

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    logger::init_logging(level);

    paths::ensure_dirs().await?;
    let db_path = config.storage.resolve_db_path();
    let store = storage::open(&db_path)?;

    match cli.command {
        Some(Commands::Recipe { action }) => match action {
            RecipeAction::Import { path, user } => {
                souschef::cli::recipe::import_recipe(&store, Path::new(&path), user)
            }
            RecipeAction::List => souschef::cli::recipe::list_recipes(&store),
        },
        Some(Commands::Status { details }) => {
            souschef::cli::status::show_status(&store, &config, details)
        }
        Some(Commands::Cancel { user_id }) => {
            souschef::cli::session::cancel_session(&store, user_id).map(|_| ())
        }
        Some(Commands::Run) | None => run_bot(store, &config).await,
    }
}

/// Wire the store, engine and Telegram transport together and run the bot.
async fn run_bot(store: storage::Store, config: &Config) -> anyhow::Result<()> {
    let token = config.telegram.resolve_token().ok_or_else(|| {
        SousChefError::Config(
            "no Telegram bot token; set SOUSCHEF_BOT_TOKEN or telegram.bot_token".into(),
        )
    })?;

    let telegram = Arc::new(TelegramAdapter::new(token, config.telegram.long_poll_secs)?);
    match telegram.validate().await {
        Ok(who) => tracing::info!("Telegram: {}", who),
        Err(e) => anyhow::bail!("Telegram token rejected: {e}"),
    }

    let (handle, store_task) = storage::spawn_store_server(store);
    let handle = Arc::new(handle);

    let engine = CookingEngine::new(
        handle.clone(),
        handle.clone(),
        telegram.clone(),
        Arc::new(DefaultClock),
        config.cooking.clone(),
    );
    let controller = SessionController::new(engine);
    let dispatcher = Arc::new(Dispatcher::new(controller, handle, telegram.clone()));

    let result = bot::run_bot(dispatcher, telegram).await;

    // Stopped watchers may still hold store handles
    store_task.abort();
    result
}
