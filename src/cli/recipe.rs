// src/cli/recipe.rs — `souschef recipe import|list`

use std::path::Path;

use crate::cooking::types::{RecipeDraft, UserId};
use crate::storage::Store;

/// Parse a recipe file. `.json` files are JSON, everything else TOML.
pub fn parse_recipe_file(path: &Path, content: &str) -> anyhow::Result<RecipeDraft> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let draft: RecipeDraft = if is_json {
        serde_json::from_str(content)?
    } else {
        toml::from_str(content)?
    };

    if draft.name.trim().is_empty() {
        anyhow::bail!("recipe has no name");
    }
    if draft.steps.is_empty() {
        anyhow::bail!("recipe '{}' has no steps", draft.name);
    }
    Ok(draft)
}

pub fn import_recipe(store: &Store, path: &Path, user_id: Option<UserId>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let mut draft = parse_recipe_file(path, &content)?;
    if user_id.is_some() {
        draft.user_id = user_id;
    }

    let recipe_id = store.insert_recipe(&draft)?;
    tracing::info!("Imported recipe {} from {}", recipe_id, path.display());
    println!(
        "Imported '{}' as recipe {} ({} steps). Start it with /cook {}",
        draft.name,
        recipe_id,
        draft.steps.len(),
        recipe_id
    );
    Ok(())
}

pub fn list_recipes(store: &Store) -> anyhow::Result<()> {
    let recipes = store.list_recipes()?;
    if recipes.is_empty() {
        println!("No recipes yet. Import one with `souschef recipe import <file>`.");
        return Ok(());
    }

    for r in recipes {
        let total: u32 = r.steps.iter().map(|s| s.duration_minutes).sum();
        println!(
            "  {:>4}  {}{}  ({} steps, ~{} min)",
            r.recipe_id,
            r.name,
            if r.is_favorite { " ⭐️" } else { "" },
            r.step_count(),
            total
        );
    }
    Ok(())
}
