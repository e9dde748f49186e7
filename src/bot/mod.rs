// src/bot/mod.rs — Long-running bot loop
//
// Pulls updates from the chat transport and dispatches them until Ctrl+C.
// Watchers are reconciled once at startup and stopped on shutdown; sessions
// stay in the store and resume on the next start.

pub mod dispatch;

use std::sync::Arc;
use std::time::Duration;

use crate::integrations::types::ChatTransport;

pub use dispatch::Dispatcher;

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Run the bot loop.
pub async fn run_bot(dispatcher: Arc<Dispatcher>, transport: Arc<dyn ChatTransport>) -> anyhow::Result<()> {
    let engine = dispatcher.controller().engine().clone();

    tracing::info!("SousChef bot starting...");
    let resumed = engine.resume_watchers().await?;
    if resumed > 0 {
        println!("Resumed {resumed} cooking session(s).");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    println!("Bot running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            polled = transport.poll_updates() => {
                match polled {
                    Ok(updates) => {
                        // Updates in one batch may come from different users
                        let handlers = updates.into_iter().map(|u| dispatcher.handle(u));
                        futures::future::join_all(handlers).await;
                    }
                    Err(e) => {
                        tracing::warn!("Polling updates failed: {}", e);
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                println!("\nShutting down bot...");
                engine.shutdown();
                break;
            }
        }
    }

    tracing::info!("Bot stopped.");
    Ok(())
}
