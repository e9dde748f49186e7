// tests/common/mod.rs — Shared harness: in-memory store, recording transport, mutable clock

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use souschef::cooking::ports::{RecipeCatalog, RecipeSource, SessionStore};
use souschef::cooking::types::{CookingSession, Recipe, RecipeDraft, RecipeId, RecipeStep, UserId};
use souschef::cooking::{CookingEngine, SessionController};
use souschef::infra::config::CookingConfig;
use souschef::infra::errors::{Result, SousChefError};
use souschef::integrations::types::{
    ChatTarget, ChatTransport, IncomingUpdate, Notifier, OutgoingMessage, Toast,
};
use souschef::storage::{self, StoreHandle};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

// ---------- Clock ----------

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *self.0.lock().unwrap() += TimeDelta::from_std(delta).unwrap();
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.0.lock().unwrap() += TimeDelta::minutes(minutes);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

// ---------- Transport ----------

/// Records everything sent or answered; can be told to fail sends.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(i64, OutgoingMessage)>>,
    answers: Mutex<Vec<(String, Toast)>>,
    inbox: Mutex<VecDeque<IncomingUpdate>>,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        let t = Self::default();
        t.fail_sends.store(true, Ordering::SeqCst);
        t
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.text.clone())
            .collect()
    }

    pub fn messages(&self) -> Vec<(i64, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<OutgoingMessage> {
        self.sent.lock().unwrap().last().map(|(_, m)| m.clone())
    }

    pub fn answers(&self) -> Vec<(String, Toast)> {
        self.answers.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.answers.lock().unwrap().clear();
    }

    pub fn push_update(&self, update: IncomingUpdate) {
        self.inbox.lock().unwrap().push_back(update);
    }
}

#[async_trait]
impl Notifier for RecordingTransport {
    async fn send(&self, target: ChatTarget, message: &OutgoingMessage) -> anyhow::Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            anyhow::bail!("chat {} unreachable", target.chat_id);
        }
        self.sent
            .lock()
            .unwrap()
            .push((target.chat_id, message.clone()));
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn poll_updates(&self) -> anyhow::Result<Vec<IncomingUpdate>> {
        Ok(self.inbox.lock().unwrap().drain(..).collect())
    }

    async fn answer_callback(&self, callback_id: &str, toast: &Toast) -> anyhow::Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((callback_id.to_string(), toast.clone()));
        Ok(())
    }
}

/// Recipe source that has lost every recipe.
pub struct MissingRecipes;

#[async_trait]
impl RecipeSource for MissingRecipes {
    async fn get_recipe(&self, _recipe_id: RecipeId) -> Result<Option<Recipe>> {
        Ok(None)
    }
}

/// Session store whose next `n` updates fail as if the database blipped.
pub struct FlakyStore {
    inner: Arc<StoreHandle>,
    failing_updates: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<StoreHandle>, failing_updates: usize) -> Self {
        Self {
            inner,
            failing_updates: AtomicUsize::new(failing_updates),
        }
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn create(&self, session: CookingSession) -> Result<CookingSession> {
        self.inner.create(session).await
    }

    async fn get(&self, user_id: UserId) -> Result<Option<CookingSession>> {
        self.inner.get(user_id).await
    }

    async fn update(&self, session: CookingSession) -> Result<CookingSession> {
        let fail = self
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(SousChefError::StoreUnavailable("blip".into()));
        }
        self.inner.update(session).await
    }

    async fn delete(&self, user_id: UserId) -> Result<bool> {
        self.inner.delete(user_id).await
    }

    async fn delete_if_current(&self, session: &CookingSession) -> Result<bool> {
        self.inner.delete_if_current(session).await
    }

    async fn list(&self) -> Result<Vec<CookingSession>> {
        self.inner.list().await
    }
}

// ---------- Harness ----------

pub struct Harness {
    pub store: Arc<StoreHandle>,
    pub transport: Arc<RecordingTransport>,
    pub clock: Arc<MutableClock>,
    pub engine: CookingEngine,
    pub controller: SessionController,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_transport(RecordingTransport::default()).await
    }

    pub async fn with_transport(transport: RecordingTransport) -> Self {
        Self::build(transport, 0)
    }

    /// Engine whose first `failing` session updates fail; `store` still
    /// reads the real rows.
    pub async fn with_failing_updates(failing: usize) -> Self {
        Self::build(RecordingTransport::default(), failing)
    }

    fn build(transport: RecordingTransport, failing_updates: usize) -> Self {
        let store = storage::in_memory().unwrap();
        let (handle, _join) = storage::spawn_store_server(store);
        let store = Arc::new(handle);
        let transport = Arc::new(transport);
        let clock = Arc::new(MutableClock::new(t0()));

        let sessions: Arc<dyn SessionStore> = if failing_updates > 0 {
            Arc::new(FlakyStore::new(store.clone(), failing_updates))
        } else {
            store.clone()
        };
        let engine = CookingEngine::new(
            sessions,
            store.clone(),
            transport.clone(),
            clock.clone(),
            CookingConfig::default(),
        );
        let controller = SessionController::new(engine.clone());
        Self {
            store,
            transport,
            clock,
            engine,
            controller,
        }
    }

    /// Store a recipe with `(description, minutes)` steps.
    pub async fn add_recipe(&self, name: &str, steps: &[(&str, u32)]) -> Recipe {
        let draft = RecipeDraft {
            name: name.into(),
            description: String::new(),
            steps: steps
                .iter()
                .map(|(d, m)| RecipeStep::new(*d, *m))
                .collect(),
            user_id: None,
        };
        let id = self.store.save_recipe(draft).await.unwrap();
        self.store.get_recipe(id).await.unwrap().unwrap()
    }

    /// Two steps of 5 and 10 minutes.
    pub async fn pasta(&self) -> Recipe {
        self.add_recipe("Pasta", &[("Boil water", 5), ("Cook pasta", 10)])
            .await
    }

    pub async fn session(&self, user_id: UserId) -> Option<CookingSession> {
        self.store.get(user_id).await.unwrap()
    }
}
