// src/cli/status.rs — Session status display

use chrono::Utc;

use crate::cooking::types::CookingSession;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::storage::Store;

/// Display active sessions.
pub fn show_status(store: &Store, config: &Config, details: bool) -> anyhow::Result<()> {
    println!("souschef v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config_path = paths::config_file_path();
    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }
    println!(
        "  Bot token:  {}",
        if config.telegram.resolve_token().is_some() {
            "configured"
        } else {
            "missing"
        }
    );

    let sessions = store.list_sessions()?;
    let recipes = store.list_recipes()?;
    println!(
        "  Recipes:    {} stored ({} favorite)",
        recipes.len(),
        recipes.iter().filter(|r| r.is_favorite).count()
    );
    println!("  Sessions:   {} active", sessions.len());

    if details {
        println!();
        println!("  Database:   {}", config.storage.resolve_db_path().display());
        println!("  Data dir:   {}", paths::data_dir().display());
        println!("  Config dir: {}", paths::config_dir().display());
    }

    if !sessions.is_empty() {
        println!();
        for s in &sessions {
            let name = recipes
                .iter()
                .find(|r| r.recipe_id == s.recipe_id)
                .map(|r| (r.name.as_str(), r.step_count()));
            println!("  {}", describe_session(s, name));
            if details {
                println!("        session {} (version {})", s.session_id, s.version);
            }
        }
    }

    Ok(())
}

/// One-line summary of a session.
pub fn describe_session(session: &CookingSession, recipe: Option<(&str, usize)>) -> String {
    let (name, steps) = match recipe {
        Some((name, steps)) => (name.to_string(), steps.to_string()),
        None => (format!("recipe {} (missing)", session.recipe_id), "?".into()),
    };
    let state = if session.is_paused {
        "paused".to_string()
    } else {
        match session.remaining(Utc::now()) {
            Some(left) if left.num_seconds() > 0 => {
                format!("{}m{:02}s left", left.num_minutes(), left.num_seconds() % 60)
            }
            Some(_) => "due".into(),
            None => "not armed".into(),
        }
    };
    format!(
        "user {:<12} {} step {}/{} {}",
        session.user_id,
        name,
        session.current_step + 1,
        steps,
        state
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_describe_paused_session() {
        let mut s = CookingSession::new(9, 3, Utc::now());
        s.arm(5, Utc::now());
        s.is_paused = true;
        let line = describe_session(&s, Some(("Risotto", 4)));
        assert!(line.contains("Risotto step 1/4 paused"), "{line}");
    }

    #[test]
    fn test_describe_missing_recipe_and_unarmed() {
        let s = CookingSession::new(9, 3, Utc::now());
        let line = describe_session(&s, None);
        assert!(line.contains("recipe 3 (missing)"), "{line}");
        assert!(line.ends_with("not armed"), "{line}");
    }

    #[test]
    fn test_describe_due_session() {
        let mut s = CookingSession::new(9, 3, Utc::now());
        s.arm(1, Utc::now() - Duration::minutes(5));
        assert!(describe_session(&s, Some(("Tea", 1))).ends_with("due"));
    }
}
