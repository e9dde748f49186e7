// src/bot/dispatch.rs — Route chat updates to session commands

use std::sync::Arc;

use crate::cooking::messages::CallbackAction;
use crate::cooking::ports::RecipeCatalog;
use crate::cooking::types::{RecipeId, UserId};
use crate::cooking::{CommandReply, SessionController, TimerAdjust};
use crate::infra::errors::{Result, SousChefError};
use crate::integrations::types::{ChatTarget, ChatTransport, IncomingUpdate, OutgoingMessage, Toast};

/// Turns inbound updates into controller calls and replies on the transport.
pub struct Dispatcher {
    controller: SessionController,
    catalog: Arc<dyn RecipeCatalog>,
    transport: Arc<dyn ChatTransport>,
}

impl Dispatcher {
    pub fn new(
        controller: SessionController,
        catalog: Arc<dyn RecipeCatalog>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            controller,
            catalog,
            transport,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Handle one update. Reply failures are logged and swallowed.
    pub async fn handle(&self, update: IncomingUpdate) {
        match update {
            IncomingUpdate::Callback {
                callback_id,
                user_id,
                data,
                ..
            } => {
                let toast = match CallbackAction::parse(&data) {
                    Some(action) => self.toast_for(user_id, self.run(user_id, action).await),
                    None => {
                        tracing::debug!("Unknown callback data from user {}: {}", user_id, data);
                        Toast::info("")
                    }
                };
                if let Err(e) = self.transport.answer_callback(&callback_id, &toast).await {
                    tracing::warn!("Failed to answer callback {}: {}", callback_id, e);
                }
            }
            IncomingUpdate::Text {
                chat_id,
                user_id,
                text,
            } => {
                let Some(action) = CallbackAction::parse_command(&text) else {
                    return;
                };
                if let Err(e) = self.run(user_id, action).await {
                    self.log_failure(user_id, &e);
                    let reply = OutgoingMessage::new(e.user_message());
                    if let Err(e) = self.transport.send(ChatTarget::new(chat_id), &reply).await {
                        tracing::warn!("Failed to reply to chat {}: {}", chat_id, e);
                    }
                }
            }
        }
    }

    /// Execute an action for the user.
    pub async fn run(&self, user_id: UserId, action: CallbackAction) -> Result<CommandReply> {
        tracing::debug!("User {} -> {:?}", user_id, action);
        match action {
            CallbackAction::Next(epoch) => self.controller.next_step(user_id, epoch).await,
            CallbackAction::Pause => self.controller.pause(user_id).await,
            CallbackAction::Resume => self.controller.resume(user_id).await,
            CallbackAction::TimerAdd => {
                self.controller
                    .adjust_timer(user_id, TimerAdjust::Add)
                    .await
            }
            CallbackAction::TimerSub => {
                self.controller
                    .adjust_timer(user_id, TimerAdjust::Subtract)
                    .await
            }
            CallbackAction::Restart => self.controller.restart(user_id).await,
            CallbackAction::Cancel => self.controller.cancel(user_id).await,
            CallbackAction::Cook(recipe_id) => {
                self.controller.start_from_recipe(user_id, recipe_id).await
            }
            CallbackAction::SaveFavorite(recipe_id) => self.save_favorite(recipe_id).await,
            CallbackAction::Done(_) => Ok(CommandReply {
                toast: "👌 Enjoy!".into(),
            }),
        }
    }

    async fn save_favorite(&self, recipe_id: RecipeId) -> Result<CommandReply> {
        if !self.catalog.set_favorite(recipe_id, true).await? {
            return Err(SousChefError::RecipeNotFound { recipe_id });
        }
        tracing::info!("Recipe {} saved to favorites", recipe_id);
        Ok(CommandReply {
            toast: "⭐️ Saved to favorites".into(),
        })
    }

    fn toast_for(&self, user_id: UserId, result: Result<CommandReply>) -> Toast {
        match result {
            Ok(reply) => Toast::info(reply.toast),
            Err(e) => {
                self.log_failure(user_id, &e);
                Toast::alert(e.user_message())
            }
        }
    }

    fn log_failure(&self, user_id: UserId, err: &SousChefError) {
        if err.is_user_error() {
            tracing::debug!("User {} command rejected: {}", user_id, err);
        } else if err.is_transient() {
            tracing::warn!("User {} command failed: {}", user_id, err);
        } else {
            tracing::error!("User {} command failed: {}", user_id, err);
        }
    }
}
