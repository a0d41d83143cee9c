use async_trait::async_trait;

use crate::{
    domain::{ChatId, EventId},
    messaging::types::{Event, ReplyKeyboard},
    Result,
};

/// Messaging-platform port.
///
/// Telegram is the only implementation; the trait keeps the polling loop and the
/// handlers testable with in-memory fakes.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Fetch events with `id >= offset`. An empty batch is a successful outcome.
    async fn fetch_events(&self, offset: EventId) -> Result<Vec<Event>>;

    /// Send `text` (HTML) to `chat_id`, optionally with a reply keyboard.
    async fn deliver_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<()>;
}
