// src/storage/store.rs — SQLite operations

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::cooking::types::{CookingSession, Recipe, RecipeDraft, RecipeId, RecipeStep, UserId};
use crate::infra::errors::{Result, SousChefError};

const SESSION_COLUMNS: &str = "session_id, user_id, recipe_id, current_step, timer_end,
     is_paused, created_at, updated_at, version, step_epoch";

const RECIPE_COLUMNS: &str =
    "recipe_id, user_id, name, description, steps_json, is_favorite, created_at";

/// Low-level SQLite operations for sessions and recipes.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    // -- Cooking sessions --

    /// Delete-then-insert in one transaction, so a user never has two rows.
    pub fn create_session(&self, session: &CookingSession) -> Result<CookingSession> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM cooking_sessions WHERE user_id = ?1",
            params![session.user_id],
        )?;
        tx.execute(
            "INSERT INTO cooking_sessions (session_id, user_id, recipe_id, current_step,
             timer_end, is_paused, created_at, updated_at, version, step_epoch)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                session.session_id,
                session.user_id,
                session.recipe_id,
                session.current_step as i64,
                session.timer_end.map(|t| t.to_rfc3339()),
                session.is_paused,
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
                session.version as i64,
                session.step_epoch as i64
            ],
        )?;
        tx.commit()?;
        Ok(session.clone())
    }

    pub fn get_session(&self, user_id: UserId) -> Result<Option<CookingSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM cooking_sessions WHERE user_id = ?1");
        let session = self
            .conn
            .query_row(&sql, params![user_id], session_from_row)
            .optional()?;
        Ok(session)
    }

    /// Conditional on `session.version`; bumps version. `updated_at` is
    /// written as stamped by the caller's clock.
    pub fn update_session(&self, session: &CookingSession) -> Result<CookingSession> {
        let changed = self.conn.execute(
            "UPDATE cooking_sessions SET current_step = ?1, timer_end = ?2, is_paused = ?3,
             step_epoch = ?4, updated_at = ?5, version = version + 1
             WHERE session_id = ?6 AND version = ?7",
            params![
                session.current_step as i64,
                session.timer_end.map(|t| t.to_rfc3339()),
                session.is_paused,
                session.step_epoch as i64,
                session.updated_at.to_rfc3339(),
                session.session_id,
                session.version as i64
            ],
        )?;

        if changed == 0 {
            return Err(SousChefError::Conflict {
                session_id: session.session_id.clone(),
                expected: session.version,
            });
        }

        let mut updated = session.clone();
        updated.version += 1;
        Ok(updated)
    }

    pub fn delete_session(&self, user_id: UserId) -> Result<bool> {
        let count = self.conn.execute(
            "DELETE FROM cooking_sessions WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(count > 0)
    }

    pub fn delete_session_if_current(&self, session: &CookingSession) -> Result<bool> {
        let count = self.conn.execute(
            "DELETE FROM cooking_sessions WHERE session_id = ?1 AND version = ?2",
            params![session.session_id, session.version as i64],
        )?;
        Ok(count > 0)
    }

    pub fn list_sessions(&self) -> Result<Vec<CookingSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM cooking_sessions ORDER BY created_at");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], session_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Recipes --

    pub fn insert_recipe(&self, draft: &RecipeDraft) -> Result<RecipeId> {
        let steps_json = serde_json::to_string(&draft.steps).map_err(anyhow::Error::from)?;
        self.conn.execute(
            "INSERT INTO recipes (user_id, name, description, steps_json, is_favorite, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                draft.user_id,
                draft.name,
                draft.description,
                steps_json,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_recipe(&self, recipe_id: RecipeId) -> Result<Option<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE recipe_id = ?1");
        let recipe = self
            .conn
            .query_row(&sql, params![recipe_id], recipe_from_row)
            .optional()?;
        Ok(recipe)
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], recipe_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn set_favorite(&self, recipe_id: RecipeId, favorite: bool) -> Result<bool> {
        let count = self.conn.execute(
            "UPDATE recipes SET is_favorite = ?1 WHERE recipe_id = ?2",
            params![favorite, recipe_id],
        )?;
        Ok(count > 0)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

// -- Row mapping --

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<CookingSession> {
    let timer_end: Option<String> = row.get(4)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(CookingSession {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        recipe_id: row.get(2)?,
        current_step: row.get::<_, i64>(3)? as usize,
        timer_end: timer_end.map(|raw| parse_ts(4, &raw)).transpose()?,
        is_paused: row.get(5)?,
        created_at: parse_ts(6, &created_at)?,
        updated_at: parse_ts(7, &updated_at)?,
        version: row.get::<_, i64>(8)? as u64,
        step_epoch: row.get::<_, i64>(9)? as u64,
    })
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    let steps_json: String = row.get(4)?;
    let steps: Vec<RecipeStep> = serde_json::from_str(&steps_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let created_at: String = row.get(6)?;
    Ok(Recipe {
        recipe_id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        steps,
        is_favorite: row.get(5)?,
        created_at: parse_ts(6, &created_at)?,
    })
}
