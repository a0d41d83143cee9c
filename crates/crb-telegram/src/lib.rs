//! Telegram adapter.
//!
//! Implements the `crb-core` TransportClient over the raw Bot API (`getUpdates` /
//! `sendMessage`). The cursor stays with the core polling loop; this client only
//! turns offsets into batches and replies into requests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;

use crb_core::{
    domain::{ChatId, EventId},
    errors::Error,
    messaging::{
        port::TransportClient,
        types::{Event, ReplyKeyboard},
    },
    Result,
};

mod wire;

use wire::{truncate, update_to_event, Envelope, ReplyKeyboardMarkup, SendMessageRequest};

const MAX_SEND_RETRIES: usize = 1;

#[derive(Clone, Debug)]
pub struct TelegramTransport {
    base_url: String,
    http: reqwest::Client,
    // Sends run inside the poll cycle; longer flood waits fail instead of stalling it.
    max_retry_wait: Duration,
}

impl TelegramTransport {
    /// `api_base` is the Bot API root (e.g. `https://api.telegram.org`).
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("telegram http client: {e}")))?;
        Ok(Self {
            base_url: format!("{}/bot{token}", api_base.trim_end_matches('/')),
            http,
            max_retry_wait: timeout,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    // reqwest errors embed the request URL, which carries the bot token.
    fn map_err(method: &str, e: reqwest::Error) -> Error {
        Error::Transport(format!("telegram {method} request error: {}", e.without_url()))
    }

    async fn read_envelope(method: &str, resp: reqwest::Response) -> Result<(u16, Envelope<Value>)> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Self::map_err(method, e))?;

        match serde_json::from_str::<Envelope<Value>>(&body) {
            Ok(env) => Ok((status.as_u16(), env)),
            Err(_) if !status.is_success() => Err(Error::Transport(format!(
                "telegram {method} failed: {status} {}",
                truncate(&body, 200)
            ))),
            Err(e) => Err(Error::MalformedPayload(format!(
                "telegram {method} response: {e}"
            ))),
        }
    }

    async fn send_once(&self, req: &SendMessageRequest<'_>) -> Result<(u16, Envelope<Value>)> {
        let resp = self
            .http
            .post(self.url("sendMessage"))
            .json(req)
            .send()
            .await
            .map_err(|e| Self::map_err("sendMessage", e))?;
        Self::read_envelope("sendMessage", resp).await
    }
}

#[async_trait]
impl TransportClient for TelegramTransport {
    async fn fetch_events(&self, offset: EventId) -> Result<Vec<Event>> {
        let resp = self
            .http
            .get(self.url("getUpdates"))
            .query(&[("offset", offset.0)])
            .send()
            .await
            .map_err(|e| Self::map_err("getUpdates", e))?;

        let (status, env) = Self::read_envelope("getUpdates", resp).await?;
        if !(200..300).contains(&status) || !env.ok {
            return Err(Error::Transport(format!(
                "telegram getUpdates failed: {status} {}",
                env.description.unwrap_or_default()
            )));
        }

        let updates = match env.result {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(Error::MalformedPayload(format!(
                    "telegram getUpdates result is not an array: {}",
                    truncate(&other.to_string(), 200)
                )))
            }
        };

        let events: Vec<Event> = updates.iter().filter_map(update_to_event).collect();
        if !events.is_empty() {
            tracing::debug!(offset = offset.0, count = events.len(), "fetched updates");
        }
        Ok(events)
    }

    async fn deliver_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()> {
        let req = SendMessageRequest {
            chat_id: chat_id.0,
            text,
            parse_mode: "HTML",
            reply_markup: keyboard.map(ReplyKeyboardMarkup::from),
        };

        let mut attempts = 0usize;
        loop {
            let (status, env) = self.send_once(&req).await?;
            if (200..300).contains(&status) && env.ok {
                return Ok(());
            }

            let retry_after = env
                .parameters
                .as_ref()
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);
            match retry_after {
                Some(wait)
                    if status == 429
                        && attempts < MAX_SEND_RETRIES
                        && wait <= self.max_retry_wait =>
                {
                    attempts += 1;
                    tracing::warn!(
                        chat_id = chat_id.0,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, retrying"
                    );
                    sleep(wait).await;
                }
                _ => {
                    return Err(Error::Transport(format!(
                        "telegram sendMessage failed: {status} {}",
                        env.description.unwrap_or_default()
                    )))
                }
            }
        }
    }
}
