// src/cli/session.rs — `souschef cancel <user-id>`

use crate::cooking::types::UserId;
use crate::storage::Store;

/// Delete a session straight from the store. A running bot's watcher for it
/// stops on its next poll.
pub fn cancel_session(store: &Store, user_id: UserId) -> anyhow::Result<bool> {
    let removed = store.delete_session(user_id)?;
    if removed {
        tracing::info!("Cooking session for user {} cancelled from the CLI", user_id);
        println!("Cancelled the cooking session of user {user_id}.");
    } else {
        println!("User {user_id} has no active cooking session.");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooking::types::{CookingSession, RecipeDraft, RecipeStep};
    use crate::storage;
    use chrono::Utc;

    #[test]
    fn test_cancel_removes_only_that_user() {
        let store = storage::in_memory().unwrap();
        let recipe_id = store
            .insert_recipe(&RecipeDraft {
                name: "Soup".into(),
                description: String::new(),
                steps: vec![RecipeStep::new("Simmer", 20)],
                user_id: None,
            })
            .unwrap();
        store
            .create_session(&CookingSession::new(1, recipe_id, Utc::now()))
            .unwrap();
        store
            .create_session(&CookingSession::new(2, recipe_id, Utc::now()))
            .unwrap();

        assert!(cancel_session(&store, 1).unwrap());
        assert!(!cancel_session(&store, 1).unwrap());
        assert!(store.get_session(2).unwrap().is_some());
    }
}
