// src/cooking/ports.rs — Storage ports consumed by the engine and controller

use async_trait::async_trait;

use crate::cooking::types::{CookingSession, Recipe, RecipeDraft, RecipeId, UserId};
use crate::infra::errors::Result;

/// Durable mapping from user to their single active cooking session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert `session`, replacing any session the user already has.
    async fn create(&self, session: CookingSession) -> Result<CookingSession>;

    async fn get(&self, user_id: UserId) -> Result<Option<CookingSession>>;

    /// Write the mutable fields back. Fails with `Conflict` unless the stored
    /// version still equals `session.version`; returns the bumped record.
    async fn update(&self, session: CookingSession) -> Result<CookingSession>;

    /// Unconditional delete. Returns whether a row existed.
    async fn delete(&self, user_id: UserId) -> Result<bool>;

    /// Delete only if the stored version still equals `session.version`.
    async fn delete_if_current(&self, session: &CookingSession) -> Result<bool>;

    async fn list(&self) -> Result<Vec<CookingSession>>;
}

/// Read-only recipe lookup.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn get_recipe(&self, recipe_id: RecipeId) -> Result<Option<Recipe>>;
}

/// Recipe bookkeeping used by the CLI and the completion follow-ups.
#[async_trait]
pub trait RecipeCatalog: RecipeSource {
    async fn save_recipe(&self, draft: RecipeDraft) -> Result<RecipeId>;

    async fn list_recipes(&self) -> Result<Vec<Recipe>>;

    /// Returns false when the recipe does not exist.
    async fn set_favorite(&self, recipe_id: RecipeId, favorite: bool) -> Result<bool>;
}
