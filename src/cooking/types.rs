// src/cooking/types.rs — Cooking session and recipe types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = i64;
pub type RecipeId = i64;

/// One instruction of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub description: String,
    /// Minutes; generated recipes call this `duration`.
    #[serde(default, alias = "duration")]
    pub duration_minutes: u32,
}

impl RecipeStep {
    pub fn new(description: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            description: description.into(),
            duration_minutes,
        }
    }

    /// Duration with the configured floor applied.
    pub fn effective_minutes(&self, min_minutes: u32) -> u32 {
        self.duration_minutes.max(min_minutes)
    }
}

/// A stored recipe. Steps never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_id: RecipeId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub description: String,
    pub steps: Vec<RecipeStep>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn step(&self, index: usize) -> Option<&RecipeStep> {
        self.steps.get(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// True when `index` is the final step (or beyond it).
    pub fn is_last_step(&self, index: usize) -> bool {
        index + 1 >= self.steps.len()
    }
}

/// A recipe not yet stored (import files, generated recipes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<RecipeStep>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// The live state of one user's guided cooking flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookingSession {
    pub session_id: String,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
    pub current_step: usize,
    /// `None` only until the current step's timer is committed.
    pub timer_end: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful write.
    pub version: u64,
    /// Bumped every time a step timer is armed.
    pub step_epoch: u64,
}

impl CookingSession {
    pub fn new(user_id: UserId, recipe_id: RecipeId, now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            recipe_id,
            current_step: 0,
            timer_end: None,
            is_paused: false,
            created_at: now,
            updated_at: now,
            version: 0,
            step_epoch: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer_end.is_some()
    }

    /// Arm the current step: its timer ends `minutes` from `now`.
    pub fn arm(&mut self, minutes: u32, now: DateTime<Utc>) {
        self.timer_end = Some(now + Duration::minutes(i64::from(minutes)));
        self.step_epoch += 1;
        self.touch(now);
    }

    /// Stamp a pending change; the store persists `updated_at` as given.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Whether an unpaused, armed timer has run out at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_paused && self.timer_end.is_some_and(|end| now >= end)
    }

    /// Time left on the current step; negative once overdue.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.timer_end.map(|end| end - now)
    }

    pub fn watch_key(&self) -> WatchKey {
        WatchKey {
            session_id: self.session_id.clone(),
            step_epoch: self.step_epoch,
        }
    }
}

/// Identity a watcher captures at spawn time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub session_id: String,
    pub step_epoch: u64,
}

impl WatchKey {
    pub fn matches(&self, session: &CookingSession) -> bool {
        self.session_id == session.session_id && self.step_epoch == session.step_epoch
    }
}
