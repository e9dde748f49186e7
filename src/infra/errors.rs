// src/infra/errors.rs — Error types for souschef

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SousChefError {
    // User errors (reported back to the chat, no state change)
    #[error("No active cooking session")]
    NoActiveSession,

    #[error("Timer is not armed yet")]
    TimerNotArmed,

    #[error("Timer cannot be adjusted while paused")]
    PausedAdjust,

    #[error("Step was already advanced")]
    StaleStep,

    #[error("A cooking session is already active")]
    SessionAlreadyActive,

    // Data inconsistency (fatal to the session's advancement)
    #[error("Recipe {recipe_id} not found")]
    RecipeNotFound { recipe_id: i64 },

    #[error("Recipe '{name}' has no steps")]
    EmptyRecipe { name: String },

    #[error("Step {step} is out of range for a recipe with {steps} steps")]
    StepOutOfRange { step: usize, steps: usize },

    // Transient (retried on the next poll or command)
    #[error("Session {session_id} changed concurrently (expected version {expected})")]
    Conflict { session_id: String, expected: u64 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Notification to chat {chat_id} failed: {message}")]
    Notify { chat_id: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SousChefError {
    /// Errors caused by the user's request rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SousChefError::NoActiveSession
                | SousChefError::TimerNotArmed
                | SousChefError::PausedAdjust
                | SousChefError::StaleStep
                | SousChefError::SessionAlreadyActive
        )
    }

    /// Errors that a later poll or command may succeed past.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SousChefError::Conflict { .. }
                | SousChefError::StoreUnavailable(_)
                | SousChefError::Database(_)
                | SousChefError::Notify { .. }
                | SousChefError::Http(_)
        )
    }

    /// Short text suitable for a chat alert.
    pub fn user_message(&self) -> String {
        match self {
            SousChefError::NoActiveSession => "❌ No active cooking session found".into(),
            SousChefError::TimerNotArmed => "⏱ Hold on, the timer is still starting...".into(),
            SousChefError::PausedAdjust => "⏸ The timer can't be changed while paused".into(),
            SousChefError::StaleStep => "✅ That step is already done".into(),
            SousChefError::SessionAlreadyActive => {
                "⚠️ You already have an active cooking session! \
                 Finish it or cancel it with /cancel_cooking"
                    .into()
            }
            SousChefError::RecipeNotFound { .. } => "Recipe not found".into(),
            SousChefError::Conflict { .. } => "Your session just changed, please try again".into(),
            _ => "Something went wrong, please try again later".into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SousChefError>;
