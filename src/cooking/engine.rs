// src/cooking/engine.rs — Timer engine: arms step timers and runs watchers
//
// One watcher task per armed step. A watcher captures the session's
// `WatchKey` at spawn time and stops as soon as the stored session no longer
// matches it, so manual actions never have to cancel watchers explicitly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use mockable::Clock;
use tokio::sync::watch;

use crate::cooking::messages;
use crate::cooking::ports::{RecipeSource, SessionStore};
use crate::cooking::types::{CookingSession, Recipe, UserId, WatchKey};
use crate::infra::config::CookingConfig;
use crate::infra::errors::{Result, SousChefError};
use crate::integrations::types::{ChatTarget, Notifier, OutgoingMessage};

/// What a single watcher iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session gone or re-armed since the watcher was spawned.
    Stale,
    Paused,
    /// Timer not committed yet and arming it failed; retried shortly.
    Unarmed,
    /// Armed the pending step; a fresh watcher owns it now.
    Armed,
    /// Timer still running.
    Waiting,
    /// Moved to the next step; a fresh watcher owns it now.
    Advanced,
    /// Last step finished and the session was deleted.
    Completed,
    /// Store failure or lost race; check again next poll.
    Retry,
    /// Data inconsistency; the session is left untouched.
    Abandoned,
}

impl TickOutcome {
    /// Whether the watcher loop ends after this outcome.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TickOutcome::Stale
                | TickOutcome::Armed
                | TickOutcome::Advanced
                | TickOutcome::Completed
                | TickOutcome::Abandoned
        )
    }
}

struct EngineInner {
    sessions: Arc<dyn SessionStore>,
    recipes: Arc<dyn RecipeSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: CookingConfig,
    shutdown: watch::Sender<bool>,
    live_watchers: AtomicUsize,
}

/// Shared handle to the timer engine. Cheap to clone.
#[derive(Clone)]
pub struct CookingEngine {
    inner: Arc<EngineInner>,
}

impl CookingEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        recipes: Arc<dyn RecipeSource>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: CookingConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(EngineInner {
                sessions,
                recipes,
                notifier,
                clock,
                config,
                shutdown,
                live_watchers: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CookingConfig {
        &self.inner.config
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.inner.sessions
    }

    pub fn recipes(&self) -> &Arc<dyn RecipeSource> {
        &self.inner.recipes
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.utc()
    }

    /// Number of watcher loops currently running.
    pub fn live_watchers(&self) -> usize {
        self.inner.live_watchers.load(Ordering::SeqCst)
    }

    /// Stop every watcher at its next suspension point. Sessions are kept.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Sole entry point creating a session: replaces any session the user
    /// has, arms step 0 and starts its watcher. If arming fails after the
    /// session was created, a watcher keyed on the unarmed session takes
    /// over and keeps trying, so the session is returned unarmed.
    pub async fn start_cooking(&self, user_id: UserId, recipe: &Recipe) -> Result<CookingSession> {
        if recipe.steps.is_empty() {
            return Err(SousChefError::EmptyRecipe {
                name: recipe.name.clone(),
            });
        }

        let session = CookingSession::new(user_id, recipe.recipe_id, self.now());
        let created = self.inner.sessions.create(session).await?;
        tracing::info!(
            "Cooking session {} started for user {} (recipe {}, {} steps)",
            created.session_id,
            user_id,
            recipe.recipe_id,
            recipe.step_count()
        );

        let pending = created.watch_key();
        match self.emit_step(created.clone(), recipe, None).await {
            Ok(armed) => Ok(armed),
            Err(e) => {
                tracing::warn!(
                    "Could not arm first step for user {}: {}; retrying in the background",
                    user_id,
                    e
                );
                self.spawn_watcher(user_id, pending);
                Ok(created)
            }
        }
    }

    /// Arm the session's current step, persist it, start its watcher and
    /// send the step to the chat. `preface` goes out before the step text.
    pub async fn emit_step(
        &self,
        mut session: CookingSession,
        recipe: &Recipe,
        preface: Option<OutgoingMessage>,
    ) -> Result<CookingSession> {
        let step = recipe
            .step(session.current_step)
            .ok_or(SousChefError::StepOutOfRange {
                step: session.current_step,
                steps: recipe.step_count(),
            })?;
        let minutes = step.effective_minutes(self.inner.config.min_step_minutes);

        session.arm(minutes, self.now());
        let saved = self.inner.sessions.update(session).await?;

        tracing::info!(
            "Timer armed for user {}: step {}/{} ends at {}",
            saved.user_id,
            saved.current_step + 1,
            recipe.step_count(),
            saved
                .timer_end
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        );

        self.spawn_watcher(saved.user_id, saved.watch_key());

        if let Some(preface) = preface {
            self.notify(saved.user_id, &preface).await;
        }
        self.notify(
            saved.user_id,
            &messages::step_message(recipe, &saved, minutes),
        )
        .await;

        Ok(saved)
    }

    /// Delete a finished session and congratulate the user. Returns false
    /// when the session changed since it was read.
    pub async fn finish(&self, session: &CookingSession, recipe: &Recipe) -> Result<bool> {
        if !self.inner.sessions.delete_if_current(session).await? {
            return Ok(false);
        }
        tracing::info!(
            "Cooking session {} completed for user {} ('{}')",
            session.session_id,
            session.user_id,
            recipe.name
        );
        self.notify(session.user_id, &messages::completion(recipe))
            .await;
        Ok(true)
    }

    /// Fire-and-forget delivery: failures are logged, never returned.
    pub async fn notify(&self, user_id: UserId, message: &OutgoingMessage) {
        let target = ChatTarget::new(user_id);
        if let Err(e) = self.inner.notifier.send(target, message).await {
            let err = SousChefError::Notify {
                chat_id: target.chat_id,
                message: e.to_string(),
            };
            tracing::warn!("{}", err);
        }
    }

    /// One watcher iteration for `key`.
    pub async fn tick(&self, user_id: UserId, key: &WatchKey) -> TickOutcome {
        let session = match self.inner.sessions.get(user_id).await {
            Ok(Some(s)) => s,
            Ok(None) => return TickOutcome::Stale,
            Err(e) => {
                tracing::warn!("Watcher for user {} failed to read session: {}", user_id, e);
                return TickOutcome::Retry;
            }
        };

        if !key.matches(&session) {
            return TickOutcome::Stale;
        }
        if session.is_paused {
            return TickOutcome::Paused;
        }
        if session.is_armed() && !session.is_due(self.now()) {
            return TickOutcome::Waiting;
        }

        let recipe = match self.inner.recipes.get_recipe(session.recipe_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                tracing::error!(
                    "Session {} references missing recipe {}; leaving it for manual cleanup",
                    session.session_id,
                    session.recipe_id
                );
                return TickOutcome::Abandoned;
            }
            Err(e) => {
                tracing::warn!(
                    "Watcher for user {} failed to load recipe {}: {}",
                    user_id,
                    session.recipe_id,
                    e
                );
                return TickOutcome::Retry;
            }
        };

        if !session.is_armed() {
            return match self.emit_step(session, &recipe, None).await {
                Ok(_) => TickOutcome::Armed,
                Err(e) => {
                    tracing::warn!("Watcher for user {} failed to arm step: {}", user_id, e);
                    TickOutcome::Unarmed
                }
            };
        }

        if recipe.is_last_step(session.current_step) {
            return match self.finish(&session, &recipe).await {
                Ok(true) => TickOutcome::Completed,
                Ok(false) => TickOutcome::Retry,
                Err(e) => {
                    tracing::warn!("Watcher for user {} failed to complete: {}", user_id, e);
                    TickOutcome::Retry
                }
            };
        }

        let mut next = session;
        next.current_step += 1;
        let finished = next.current_step;
        match self
            .emit_step(next, &recipe, Some(messages::step_done(finished)))
            .await
        {
            Ok(_) => TickOutcome::Advanced,
            Err(e) if e.is_transient() => {
                tracing::debug!("Watcher for user {} lost a race: {}", user_id, e);
                TickOutcome::Retry
            }
            Err(e) => {
                tracing::error!("Watcher for user {} cannot advance: {}", user_id, e);
                TickOutcome::Abandoned
            }
        }
    }

    pub fn spawn_watcher(&self, user_id: UserId, key: WatchKey) {
        if self.is_shut_down() {
            return;
        }
        tokio::spawn(self.clone().watch(user_id, key));
    }

    fn watch(self, user_id: UserId, key: WatchKey) -> BoxFuture<'static, ()> {
        async move {
            let inner = self.inner.clone();
            inner.live_watchers.fetch_add(1, Ordering::SeqCst);
            let _guard = WatcherGuard(&inner.live_watchers);
            let mut shutdown = inner.shutdown.subscribe();
            // Epoch 0 has never been armed
            let mut delay = if key.step_epoch == 0 {
                inner.config.arm_wait()
            } else {
                inner.config.poll_interval()
            };

            tracing::debug!(
                "Watcher started for user {} (session {}, epoch {})",
                user_id,
                key.session_id,
                key.step_epoch
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => break,
                }

                delay = inner.config.poll_interval();
                let outcome = self.tick(user_id, &key).await;
                tracing::debug!("Watcher tick for user {}: {:?}", user_id, outcome);

                if outcome == TickOutcome::Unarmed {
                    delay = inner.config.arm_wait();
                }
                if outcome.is_terminal() {
                    break;
                }
            }
        }
        .boxed()
    }

    /// Reconcile persisted sessions after a restart: unarmed sessions get
    /// their current step re-armed, armed ones get a fresh watcher.
    pub async fn resume_watchers(&self) -> Result<usize> {
        let sessions = self.inner.sessions.list().await?;
        let mut resumed = 0;

        for session in sessions {
            if session.is_armed() {
                self.spawn_watcher(session.user_id, session.watch_key());
                resumed += 1;
                continue;
            }

            match self.inner.recipes.get_recipe(session.recipe_id).await {
                Ok(Some(recipe)) => {
                    let user_id = session.user_id;
                    match self.emit_step(session, &recipe, None).await {
                        Ok(_) => resumed += 1,
                        Err(e) => {
                            tracing::warn!("Could not re-arm session for user {}: {}", user_id, e)
                        }
                    }
                }
                Ok(None) => tracing::error!(
                    "Session {} references missing recipe {}",
                    session.session_id,
                    session.recipe_id
                ),
                Err(e) => tracing::warn!(
                    "Could not load recipe {} for user {}: {}",
                    session.recipe_id,
                    session.user_id,
                    e
                ),
            }
        }

        tracing::info!("Resumed {} cooking session watcher(s)", resumed);
        Ok(resumed)
    }
}

struct WatcherGuard<'a>(&'a AtomicUsize);

impl Drop for WatcherGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
