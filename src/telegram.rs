//! Minimal Telegram Bot API client.
//!
//! Covers the three calls the bot needs: `getUpdates` long polling for
//! inbound commands, `sendMessage` for text replies and `sendPhoto` for
//! rendered charts. Delivery failures are surfaced to the caller but never
//! feed back into the polling schedule.

use crate::core::SubscriberId;
use serde::Deserialize;
use std::time::Duration;

/// How long a `getUpdates` call is allowed to block server-side.
const LONG_POLL_SECS: u64 = 30;

/// Telegram Bot API client.
pub struct TelegramClient {
    base_url: String,
    client: reqwest::Client,
}

/// Telegram client error types.
#[derive(Debug)]
pub enum TelegramError {
    /// Network/HTTP error
    Network(String),
    /// Response body could not be decoded
    Decode(String),
    /// The Bot API rejected the request
    Api(String),
}

impl std::fmt::Display for TelegramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelegramError::Network(msg) => write!(f, "Telegram network error: {msg}"),
            TelegramError::Decode(msg) => write!(f, "Telegram decode error: {msg}"),
            TelegramError::Api(msg) => write!(f, "Telegram API error: {msg}"),
        }
    }
}

impl std::error::Error for TelegramError {}

/// One inbound update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonically increasing update identifier
    pub update_id: i64,
    /// The message carried by this update, if any
    pub message: Option<Message>,
}

/// An inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// The chat the message was sent in
    pub chat: Chat,
    /// Text content, if this is a text message
    pub text: Option<String>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope every Bot API response is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TelegramError> {
        if self.ok {
            self.result
                .ok_or_else(|| TelegramError::Decode("missing result field".to_string()))
        } else {
            Err(TelegramError::Api(
                self.description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

impl TelegramClient {
    /// Create a new client for the given bot token.
    pub fn new(token: &str) -> Self {
        // The client timeout must outlast the server-side long poll.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("https://api.telegram.org/bot{token}"),
            client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Long-poll for updates after the given offset.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("offset", offset), ("timeout", LONG_POLL_SECS as i64)])
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.to_string()))?;

        response
            .json::<ApiResponse<Vec<Update>>>()
            .await
            .map_err(|e| TelegramError::Decode(e.to_string()))?
            .into_result()
    }

    /// Send a text message to a chat.
    pub async fn send_message(
        &self,
        chat: SubscriberId,
        text: &str,
    ) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": chat.0,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.to_string()))?;

        response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .map_err(|e| TelegramError::Decode(e.to_string()))?
            .into_result()
            .map(|_| ())
    }

    /// Send a PNG photo to a chat with a caption.
    pub async fn send_photo(
        &self,
        chat: SubscriberId,
        png: Vec<u8>,
        caption: &str,
    ) -> Result<(), TelegramError> {
        let photo = reqwest::multipart::Part::bytes(png)
            .file_name("chart.png")
            .mime_str("image/png")
            .map_err(|e| TelegramError::Api(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat.0.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TelegramError::Network(e.to_string()))?;

        response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .map_err(|e| TelegramError::Decode(e.to_string()))?
            .into_result()
            .map(|_| ())
    }
}
