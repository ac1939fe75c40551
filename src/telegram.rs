//! Chat transport: inbound events, outbound actions, and the Telegram Bot API client.
//!
//! The dispatcher only sees [`ChatTransport`]. [`TelegramClient`] implements
//! it with blocking long polling over `getUpdates`, `sendMessage` and
//! `answerCallbackQuery`.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{InventoryError, InventoryResult};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const USER_AGENT: &str = concat!("inventory-bot/", env!("CARGO_PKG_VERSION"));
/// Added on top of the long-poll timeout so the HTTP client never gives up first.
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    TextMessage {
        chat_id: i64,
        sender: Option<String>,
        text: String,
    },
    Callback {
        chat_id: i64,
        sender: Option<String>,
        event_id: String,
        payload: String,
    },
}

impl InboundEvent {
    pub fn chat_id(&self) -> i64 {
        match self {
            InboundEvent::TextMessage { chat_id, .. } | InboundEvent::Callback { chat_id, .. } => {
                *chat_id
            }
        }
    }

    pub fn sender(&self) -> Option<&str> {
        match self {
            InboundEvent::TextMessage { sender, .. } | InboundEvent::Callback { sender, .. } => {
                sender.as_deref()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl KeyboardButton {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            text: label.into(),
            callback_data: payload.into(),
        }
    }
}

/// Rows of buttons, rendered in order.
pub type Keyboard = Vec<Vec<KeyboardButton>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub parse_mode: Option<ParseMode>,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
            parse_mode: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Markdown);
        self
    }
}

pub trait ChatTransport {
    /// Blocks until the next batch of inbound events is available.
    fn poll(&mut self) -> InventoryResult<Vec<InboundEvent>>;
    fn send(&self, message: &OutboundMessage) -> InventoryResult<()>;
    /// Clears the pending indicator of a callback event.
    fn acknowledge(&self, event_id: &str, notice: &str) -> InventoryResult<()>;
}

// ── Bot API wire types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    update_id: i64,
    message: Option<Message>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    from: Option<User>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: User,
    message: Option<Message>,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: &'a Keyboard,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
struct AnswerCallbackRequest<'a> {
    callback_query_id: &'a str,
    text: &'a str,
}

impl Update {
    /// Updates that are neither a message nor an answerable callback are dropped.
    fn into_event(self) -> Option<InboundEvent> {
        if let Some(message) = self.message {
            return Some(InboundEvent::TextMessage {
                chat_id: message.chat.id,
                sender: message.from.and_then(|user| user.username),
                text: message.text.unwrap_or_default(),
            });
        }
        let query = self.callback_query?;
        let chat_id = query.message.as_ref()?.chat.id;
        Some(InboundEvent::Callback {
            chat_id,
            sender: query.from.username,
            event_id: query.id,
            payload: query.data.unwrap_or_default(),
        })
    }
}

pub(crate) fn parse_updates(body: &str) -> InventoryResult<(Vec<InboundEvent>, Option<i64>)> {
    let updates: Vec<Update> = unwrap_response(
        serde_json::from_str(body)
            .map_err(|e| InventoryError::Chat(format!("invalid getUpdates response: {e}")))?,
    )?;
    let last_id = updates.iter().map(|u| u.update_id).max();
    let events = updates.into_iter().filter_map(Update::into_event).collect();
    Ok((events, last_id))
}

fn unwrap_response<T>(response: ApiResponse<T>) -> InventoryResult<T> {
    if !response.ok {
        return Err(InventoryError::Chat(
            response
                .description
                .unwrap_or_else(|| "request was not ok".to_string()),
        ));
    }
    response
        .result
        .ok_or_else(|| InventoryError::Chat("response missing result".to_string()))
}

// ── Client ──────────────────────────────────────────────────────────

pub struct TelegramClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
    poll_timeout_secs: u64,
    offset: Option<i64>,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, poll_timeout_secs: u64) -> InventoryResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(
                poll_timeout_secs + HTTP_TIMEOUT_MARGIN_SECS,
            ))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InventoryError::Chat(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            poll_timeout_secs,
            offset: None,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    fn call<B, T>(&self, method: &str, body: &B) -> InventoryResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .map_err(|e| InventoryError::Chat(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| InventoryError::Chat(format!("{method} response unreadable: {e}")))?;
        let parsed: ApiResponse<T> = serde_json::from_str(&text).map_err(|_| {
            InventoryError::Chat(format!("{method} failed ({}): {text}", status.as_u16()))
        })?;
        unwrap_response(parsed)
    }

    /// Username of the bot account; used as a startup credential check.
    pub fn get_me(&self) -> InventoryResult<String> {
        let me: BotUser = self.call("getMe", &serde_json::json!({}))?;
        Ok(me.username.unwrap_or_default())
    }
}

impl ChatTransport for TelegramClient {
    fn poll(&mut self) -> InventoryResult<Vec<InboundEvent>> {
        let mut body = serde_json::json!({ "timeout": self.poll_timeout_secs });
        if let Some(offset) = self.offset {
            body["offset"] = serde_json::json!(offset);
        }
        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .json(&body)
            .send()
            .map_err(|e| InventoryError::Chat(format!("getUpdates request failed: {e}")))?;
        let text = response
            .text()
            .map_err(|e| InventoryError::Chat(format!("getUpdates response unreadable: {e}")))?;
        let (events, last_id) = parse_updates(&text)?;
        if let Some(id) = last_id {
            self.offset = Some(id + 1);
        }
        debug!("Received {} event(s)", events.len());
        Ok(events)
    }

    fn send(&self, message: &OutboundMessage) -> InventoryResult<()> {
        let request = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: message.parse_mode,
            reply_markup: message
                .keyboard
                .as_ref()
                .map(|inline_keyboard| InlineKeyboardMarkup { inline_keyboard }),
        };
        let _: serde_json::Value = self.call("sendMessage", &request)?;
        Ok(())
    }

    fn acknowledge(&self, event_id: &str, notice: &str) -> InventoryResult<()> {
        let request = AnswerCallbackRequest {
            callback_query_id: event_id,
            text: notice,
        };
        let _: serde_json::Value = self.call("answerCallbackQuery", &request)?;
        Ok(())
    }
}
