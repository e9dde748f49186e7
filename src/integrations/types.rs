// src/integrations/types.rs — Chat transport traits and message types

use async_trait::async_trait;
use serde::Serialize;

/// Where a notification goes. In private chats the chat id is the user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatTarget {
    pub chat_id: i64,
}

impl ChatTarget {
    pub fn new(chat_id: i64) -> Self {
        Self { chat_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Plain,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of buttons attached under a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InlineKeyboard {
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a row.
    pub fn row(mut self, buttons: Vec<InlineButton>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Every callback payload, row by row.
    pub fn callback_data(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}

/// A message headed to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub parse_mode: ParseMode,
    pub keyboard: Option<InlineKeyboard>,
}

impl OutgoingMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Plain,
            keyboard: None,
        }
    }

    /// Builder: render as Markdown.
    pub fn markdown(mut self) -> Self {
        self.parse_mode = ParseMode::Markdown;
        self
    }

    /// Builder: attach an inline keyboard.
    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// An update pulled from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingUpdate {
    Text {
        chat_id: i64,
        user_id: i64,
        text: String,
    },
    Callback {
        callback_id: String,
        chat_id: i64,
        user_id: i64,
        data: String,
    },
}

/// Short reply to a button press; `alert` shows a modal instead of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub alert: bool,
}

impl Toast {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: false,
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: true,
        }
    }
}

/// Outbound side: deliver a message to a chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: ChatTarget, message: &OutgoingMessage) -> anyhow::Result<()>;
}

/// Inbound side of a chat integration.
#[async_trait]
pub trait ChatTransport: Notifier {
    /// Fetch the next batch of updates, waiting up to the transport's poll timeout.
    async fn poll_updates(&self) -> anyhow::Result<Vec<IncomingUpdate>>;

    async fn answer_callback(&self, callback_id: &str, toast: &Toast) -> anyhow::Result<()>;
}
