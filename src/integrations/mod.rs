// src/integrations/mod.rs — Chat integration layer

pub mod telegram;
pub mod types;

pub use telegram::TelegramAdapter;
pub use types::{ChatTarget, ChatTransport, IncomingUpdate, Notifier, OutgoingMessage, Toast};
