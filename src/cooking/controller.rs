// src/cooking/controller.rs — User-initiated session commands
//
// Every command is read-modify-write through the version-checked store, so a
// command that loses a race with a watcher fails with `Conflict` instead of
// clobbering it.

use chrono::Duration;

use crate::cooking::engine::CookingEngine;
use crate::cooking::messages;
use crate::cooking::types::{CookingSession, Recipe, RecipeId, UserId};
use crate::infra::errors::{Result, SousChefError};

/// Direction of a manual timer adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAdjust {
    Add,
    Subtract,
}

/// Short acknowledgement for the button press or command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub toast: String,
}

impl CommandReply {
    fn new(toast: impl Into<String>) -> Self {
        Self {
            toast: toast.into(),
        }
    }
}

#[derive(Clone)]
pub struct SessionController {
    engine: CookingEngine,
}

impl SessionController {
    pub fn new(engine: CookingEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &CookingEngine {
        &self.engine
    }

    async fn session(&self, user_id: UserId) -> Result<CookingSession> {
        self.engine
            .sessions()
            .get(user_id)
            .await?
            .ok_or(SousChefError::NoActiveSession)
    }

    async fn recipe(&self, recipe_id: RecipeId) -> Result<Recipe> {
        self.engine
            .recipes()
            .get_recipe(recipe_id)
            .await?
            .ok_or(SousChefError::RecipeNotFound { recipe_id })
    }

    /// Start cooking from the front door (favorites, `/cook`). Refuses when
    /// the user is already cooking.
    pub async fn start_from_recipe(
        &self,
        user_id: UserId,
        recipe_id: RecipeId,
    ) -> Result<CommandReply> {
        if self.engine.sessions().get(user_id).await?.is_some() {
            return Err(SousChefError::SessionAlreadyActive);
        }
        let recipe = self.recipe(recipe_id).await?;
        self.engine.start_cooking(user_id, &recipe).await?;
        Ok(CommandReply::new("👨‍🍳 Let's cook!"))
    }

    /// Skip the rest of the current step. `seen_epoch` is the epoch carried
    /// by the tapped button; a mismatch means the step already moved on.
    pub async fn next_step(&self, user_id: UserId, seen_epoch: Option<u64>) -> Result<CommandReply> {
        let session = self.session(user_id).await?;
        if let Some(epoch) = seen_epoch {
            if epoch != session.step_epoch {
                tracing::debug!(
                    "Ignoring stale next for user {} (seen epoch {}, current {})",
                    user_id,
                    epoch,
                    session.step_epoch
                );
                return Err(SousChefError::StaleStep);
            }
        }
        let recipe = self.recipe(session.recipe_id).await?;

        if recipe.is_last_step(session.current_step) {
            if !self.engine.finish(&session, &recipe).await? {
                return Err(SousChefError::Conflict {
                    session_id: session.session_id.clone(),
                    expected: session.version,
                });
            }
            return Ok(CommandReply::new("🎉 All done!"));
        }

        let mut next = session;
        next.current_step += 1;
        self.engine
            .emit_step(next, &recipe, Some(messages::moving_on()))
            .await?;
        Ok(CommandReply::new("➡️ Next step"))
    }

    /// Freeze automatic advancement. The deadline itself is not moved.
    /// Pausing twice re-persists and re-sends the paused keyboard.
    pub async fn pause(&self, user_id: UserId) -> Result<CommandReply> {
        let mut session = self.session(user_id).await?;
        session.is_paused = true;
        session.touch(self.engine.now());
        let saved = self.engine.sessions().update(session).await?;
        tracing::info!("Cooking paused for user {}", user_id);
        self.engine
            .notify(user_id, &messages::paused(saved.step_epoch))
            .await;
        Ok(CommandReply::new("⏸ Paused"))
    }

    /// Clear the pause flag; an expired deadline fires on the next poll.
    pub async fn resume(&self, user_id: UserId) -> Result<CommandReply> {
        let mut session = self.session(user_id).await?;
        session.is_paused = false;
        session.touch(self.engine.now());
        let saved = self.engine.sessions().update(session).await?;
        tracing::info!("Cooking resumed for user {}", user_id);
        self.engine
            .notify(user_id, &messages::resumed(saved.step_epoch))
            .await;
        Ok(CommandReply::new("▶️ Resumed"))
    }

    /// Shift the running timer by the configured step. The step epoch is
    /// kept, so the current watcher picks up the new deadline.
    pub async fn adjust_timer(&self, user_id: UserId, adjust: TimerAdjust) -> Result<CommandReply> {
        let mut session = self.session(user_id).await?;
        let end = session.timer_end.ok_or(SousChefError::TimerNotArmed)?;
        if session.is_paused {
            return Err(SousChefError::PausedAdjust);
        }

        let minutes = self.engine.config().adjust_minutes;
        let delta = match adjust {
            TimerAdjust::Add => Duration::minutes(minutes),
            TimerAdjust::Subtract => -Duration::minutes(minutes),
        };
        session.timer_end = Some(end + delta);
        session.touch(self.engine.now());
        let saved = self.engine.sessions().update(session).await?;

        let left = saved
            .remaining(self.engine.now())
            .map(|d| d.num_minutes().max(0))
            .unwrap_or(0);
        tracing::info!(
            "Timer adjusted for user {} by {} min ({} min left)",
            user_id,
            delta.num_minutes(),
            left
        );

        let toast = match adjust {
            TimerAdjust::Add => format!("⏱ +{minutes} min ({left} min left)"),
            TimerAdjust::Subtract => format!("⏱ -{minutes} min ({left} min left)"),
        };
        Ok(CommandReply::new(toast))
    }

    /// Back to step one, unpaused.
    pub async fn restart(&self, user_id: UserId) -> Result<CommandReply> {
        let mut session = self.session(user_id).await?;
        let recipe = self.recipe(session.recipe_id).await?;
        session.current_step = 0;
        session.is_paused = false;
        self.engine
            .emit_step(session, &recipe, Some(messages::restarted()))
            .await?;
        tracing::info!("Cooking restarted for user {}", user_id);
        Ok(CommandReply::new("🔄 Starting over"))
    }

    /// Always allowed; wins over any in-flight watcher.
    pub async fn cancel(&self, user_id: UserId) -> Result<CommandReply> {
        if self.engine.sessions().delete(user_id).await? {
            tracing::info!("Cooking cancelled for user {}", user_id);
        }
        self.engine.notify(user_id, &messages::cancelled()).await;
        Ok(CommandReply::new("❌ Cancelled"))
    }
}
