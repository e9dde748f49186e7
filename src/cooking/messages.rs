// src/cooking/messages.rs — Chat texts, keyboards and callback payloads
//
// Button payloads are parsed back by `CallbackAction::parse`, so rendering
// and dispatch share one vocabulary.

use crate::cooking::types::{CookingSession, Recipe, RecipeId};
use crate::integrations::types::{InlineButton, InlineKeyboard, OutgoingMessage};

/// Every action a cooking button can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Optional epoch of the step the user was looking at.
    Next(Option<u64>),
    Pause,
    Resume,
    TimerAdd,
    TimerSub,
    Restart,
    Cancel,
    SaveFavorite(RecipeId),
    Done(RecipeId),
    Cook(RecipeId),
}

impl CallbackAction {
    pub fn callback_data(&self) -> String {
        match self {
            CallbackAction::Next(Some(epoch)) => format!("cooking_next:{epoch}"),
            CallbackAction::Next(None) => "cooking_next".into(),
            CallbackAction::Pause => "cooking_pause".into(),
            CallbackAction::Resume => "cooking_resume".into(),
            CallbackAction::TimerAdd => "timer_add".into(),
            CallbackAction::TimerSub => "timer_sub".into(),
            CallbackAction::Restart => "cooking_restart".into(),
            CallbackAction::Cancel => "cooking_cancel".into(),
            CallbackAction::SaveFavorite(id) => format!("complete_fav_{id}"),
            CallbackAction::Done(id) => format!("complete_done_{id}"),
            CallbackAction::Cook(id) => format!("fav_cook_{id}"),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let data = data.trim();
        if let Some(rest) = data.strip_prefix("cooking_next") {
            return match rest.strip_prefix(':') {
                Some(epoch) => epoch.parse().ok().map(|e| CallbackAction::Next(Some(e))),
                None if rest.is_empty() => Some(CallbackAction::Next(None)),
                None => None,
            };
        }
        if let Some(id) = data.strip_prefix("complete_fav_") {
            return id.parse().ok().map(CallbackAction::SaveFavorite);
        }
        if let Some(id) = data.strip_prefix("complete_done_") {
            return id.parse().ok().map(CallbackAction::Done);
        }
        if let Some(id) = data.strip_prefix("fav_cook_") {
            return id.parse().ok().map(CallbackAction::Cook);
        }
        match data {
            "cooking_pause" => Some(CallbackAction::Pause),
            "cooking_resume" => Some(CallbackAction::Resume),
            "timer_add" => Some(CallbackAction::TimerAdd),
            "timer_sub" => Some(CallbackAction::TimerSub),
            "cooking_restart" => Some(CallbackAction::Restart),
            "cooking_cancel" => Some(CallbackAction::Cancel),
            _ => None,
        }
    }

    /// Slash commands typed into the chat.
    pub fn parse_command(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        // "/cmd@botname" addresses a specific bot in group chats
        let cmd = parts.next()?.split('@').next()?;
        match cmd {
            "/cancel_cooking" => Some(CallbackAction::Cancel),
            "/next" => Some(CallbackAction::Next(None)),
            "/pause" => Some(CallbackAction::Pause),
            "/resume" => Some(CallbackAction::Resume),
            "/restart" => Some(CallbackAction::Restart),
            "/cook" => parts.next()?.parse().ok().map(CallbackAction::Cook),
            _ => None,
        }
    }
}

fn button(text: &str, action: CallbackAction) -> InlineButton {
    InlineButton::new(text, action.callback_data())
}

/// Controls under a step message.
pub fn cooking_keyboard(step_epoch: u64, is_paused: bool) -> InlineKeyboard {
    if is_paused {
        return InlineKeyboard::new()
            .row(vec![button("▶️ Resume", CallbackAction::Resume)])
            .row(vec![button("❌ Cancel", CallbackAction::Cancel)]);
    }
    InlineKeyboard::new()
        .row(vec![
            button("⏱ -1 min", CallbackAction::TimerSub),
            button("⏱ +1 min", CallbackAction::TimerAdd),
        ])
        .row(vec![button(
            "➡️ Next step",
            CallbackAction::Next(Some(step_epoch)),
        )])
        .row(vec![button("⏸ Pause", CallbackAction::Pause)])
        .row(vec![button("🔄 Start over", CallbackAction::Restart)])
        .row(vec![button("❌ Cancel", CallbackAction::Cancel)])
}

/// Follow-up choices once a dish is finished.
pub fn completion_keyboard(recipe_id: RecipeId) -> InlineKeyboard {
    InlineKeyboard::new()
        .row(vec![button(
            "⭐️ Save to favorites",
            CallbackAction::SaveFavorite(recipe_id),
        )])
        .row(vec![button("✔️ Done", CallbackAction::Done(recipe_id))])
}

/// Escape the characters legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn step_message(recipe: &Recipe, session: &CookingSession, minutes: u32) -> OutgoingMessage {
    let description = recipe
        .step(session.current_step)
        .map(|s| escape_markdown(&s.description))
        .unwrap_or_default();
    let text = format!(
        "👨‍🍳 *Step {} of {}*\n\n{}\n\n⏱ Time: {} min",
        session.current_step + 1,
        recipe.step_count(),
        description,
        minutes
    );
    OutgoingMessage::new(text)
        .markdown()
        .with_keyboard(cooking_keyboard(session.step_epoch, session.is_paused))
}

/// `number` is one-based.
pub fn step_done(number: usize) -> OutgoingMessage {
    OutgoingMessage::new(format!("✅ Step {number} done!"))
}

pub fn moving_on() -> OutgoingMessage {
    OutgoingMessage::new("➡️ Moving on to the next step")
}

pub fn completion(recipe: &Recipe) -> OutgoingMessage {
    OutgoingMessage::new(format!(
        "🎉 *Congratulations!*\n\nYour '{}' is ready! Enjoy your meal! 😋",
        escape_markdown(&recipe.name)
    ))
    .markdown()
    .with_keyboard(completion_keyboard(recipe.recipe_id))
}

pub fn paused(step_epoch: u64) -> OutgoingMessage {
    OutgoingMessage::new("⏸ *Cooking paused*\n\nTap 'Resume' when you're ready to continue.")
        .markdown()
        .with_keyboard(cooking_keyboard(step_epoch, true))
}

pub fn resumed(step_epoch: u64) -> OutgoingMessage {
    OutgoingMessage::new("▶️ Cooking resumed!").with_keyboard(cooking_keyboard(step_epoch, false))
}

pub fn restarted() -> OutgoingMessage {
    OutgoingMessage::new("🔄 Starting over!")
}

pub fn cancelled() -> OutgoingMessage {
    OutgoingMessage::new("❌ Cooking cancelled")
}
