// src/integrations/telegram.rs — Telegram adapter (Bot API)
//
// Uses the Telegram Bot API (https://core.telegram.org/bots/api) with long
// polling; no webhook server is needed.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::integrations::types::{
    ChatTarget, ChatTransport, IncomingUpdate, Notifier, OutgoingMessage, ParseMode, Toast,
};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram chat transport.
pub struct TelegramAdapter {
    client: Client,
    bot_token: String,
    long_poll_secs: u64,
    /// Next `update_id` to request; acknowledges everything before it.
    offset: AtomicI64,
}

impl TelegramAdapter {
    pub fn new(bot_token: String, long_poll_secs: u64) -> anyhow::Result<Self> {
        // The HTTP timeout must outlive the long poll itself
        let client = Client::builder()
            .timeout(Duration::from_secs(long_poll_secs + 10))
            .build()?;
        Ok(Self {
            client,
            bot_token,
            long_poll_secs,
            offset: AtomicI64::new(0),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{TELEGRAM_API_BASE}/bot{}/{method}", self.bot_token)
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &Value,
    ) -> anyhow::Result<Option<T>> {
        let resp: TelegramResponse<T> = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            anyhow::bail!(
                "Telegram {method} failed: {}",
                resp.description.unwrap_or_else(|| "unknown".into())
            );
        }
        Ok(resp.result)
    }

    /// Validate the bot token by calling getMe.
    pub async fn validate(&self) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct BotUser {
            username: Option<String>,
            first_name: Option<String>,
        }

        let bot: Option<BotUser> = self.call("getMe", &serde_json::json!({})).await?;
        let bot = bot.unwrap_or(BotUser {
            username: None,
            first_name: None,
        });
        Ok(format!(
            "Authenticated as @{}",
            bot.username
                .unwrap_or_else(|| bot.first_name.unwrap_or_default())
        ))
    }
}

// -- Telegram API response types --

#[derive(Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct TgMessage {
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Deserialize)]
struct TgUser {
    id: i64,
}

#[derive(Deserialize)]
struct TgCallbackQuery {
    id: String,
    from: TgUser,
    message: Option<TgMessage>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
    callback_query: Option<TgCallbackQuery>,
}

impl TgUpdate {
    /// Only text messages and button presses matter; everything else is dropped.
    fn into_incoming(self) -> Option<IncomingUpdate> {
        if let Some(cb) = self.callback_query {
            let chat_id = cb.message.as_ref().map(|m| m.chat.id).unwrap_or(cb.from.id);
            return Some(IncomingUpdate::Callback {
                callback_id: cb.id,
                chat_id,
                user_id: cb.from.id,
                data: cb.data?,
            });
        }
        let msg = self.message?;
        let user_id = msg.from.as_ref().map(|u| u.id).unwrap_or(msg.chat.id);
        Some(IncomingUpdate::Text {
            chat_id: msg.chat.id,
            user_id,
            text: msg.text?,
        })
    }
}

/// JSON body for `sendMessage`.
fn send_message_body(target: ChatTarget, message: &OutgoingMessage) -> Value {
    let mut body = serde_json::json!({
        "chat_id": target.chat_id,
        "text": message.text,
    });
    if message.parse_mode == ParseMode::Markdown {
        body["parse_mode"] = Value::from("Markdown");
    }
    if let Some(ref keyboard) = message.keyboard {
        body["reply_markup"] = serde_json::to_value(keyboard).unwrap_or(Value::Null);
    }
    body
}

/// Decode a `getUpdates` result into updates plus the next offset.
fn decode_updates(updates: Vec<TgUpdate>, offset: i64) -> (Vec<IncomingUpdate>, i64) {
    let next = updates
        .iter()
        .map(|u| u.update_id + 1)
        .fold(offset, i64::max);
    let incoming = updates
        .into_iter()
        .filter_map(TgUpdate::into_incoming)
        .collect();
    (incoming, next)
}

// -- Notifier / ChatTransport implementation --

#[async_trait]
impl Notifier for TelegramAdapter {
    async fn send(&self, target: ChatTarget, message: &OutgoingMessage) -> anyhow::Result<()> {
        let body = send_message_body(target, message);
        let _: Option<Value> = self.call("sendMessage", &body).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramAdapter {
    async fn poll_updates(&self) -> anyhow::Result<Vec<IncomingUpdate>> {
        let offset = self.offset.load(Ordering::SeqCst);
        let body = serde_json::json!({
            "offset": offset,
            "timeout": self.long_poll_secs,
            "allowed_updates": ["message", "callback_query"],
        });

        let updates: Vec<TgUpdate> = self.call("getUpdates", &body).await?.unwrap_or_default();
        let (incoming, next) = decode_updates(updates, offset);
        self.offset.store(next, Ordering::SeqCst);
        Ok(incoming)
    }

    async fn answer_callback(&self, callback_id: &str, toast: &Toast) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "callback_query_id": callback_id,
            "text": toast.text,
            "show_alert": toast.alert,
        });
        let _: Option<Value> = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::types::{InlineButton, InlineKeyboard};

    #[test]
    fn test_send_body_plain() {
        let body = send_message_body(ChatTarget::new(42), &OutgoingMessage::new("hi"));
        assert_eq!(body["chat_id"], 42);
        assert_eq!(body["text"], "hi");
        assert!(body.get("parse_mode").is_none());
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn test_send_body_with_keyboard() {
        let kb = InlineKeyboard::new().row(vec![InlineButton::new("Go", "cooking_next:2")]);
        let msg = OutgoingMessage::new("*Step*").markdown().with_keyboard(kb);
        let body = send_message_body(ChatTarget::new(7), &msg);
        assert_eq!(body["parse_mode"], "Markdown");
        assert_eq!(
            body["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "cooking_next:2"
        );
    }

    #[test]
    fn test_decode_updates() {
        let raw = r#"[
            {"update_id": 10, "message": {"chat": {"id": 5}, "from": {"id": 5}, "text": "/pause"}},
            {"update_id": 11, "callback_query": {"id": "cb1", "from": {"id": 5},
                "message": {"chat": {"id": 5}}, "data": "timer_add"}},
            {"update_id": 12, "message": {"chat": {"id": 5}, "from": {"id": 5}}}
        ]"#;
        let updates: Vec<TgUpdate> = serde_json::from_str(raw).unwrap();
        let (incoming, next) = decode_updates(updates, 0);

        assert_eq!(next, 13);
        assert_eq!(
            incoming,
            vec![
                IncomingUpdate::Text {
                    chat_id: 5,
                    user_id: 5,
                    text: "/pause".into()
                },
                IncomingUpdate::Callback {
                    callback_id: "cb1".into(),
                    chat_id: 5,
                    user_id: 5,
                    data: "timer_add".into()
                },
            ]
        );
    }

    #[test]
    fn test_decode_empty_keeps_offset() {
        let (incoming, next) = decode_updates(Vec::new(), 99);
        assert!(incoming.is_empty());
        assert_eq!(next, 99);
    }
}
