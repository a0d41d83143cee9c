//! Event handlers.
//!
//! Each handler turns one classified event into backend calls and a reply. Handlers
//! never return errors: every failure is logged where it happens so the polling
//! loop keeps moving.

use std::sync::Arc;

use crate::{
    domain::ChatId,
    messaging::{port::TransportClient, types::ReplyKeyboard},
    ports::BackendClient,
};

pub mod contact;
pub mod greet;
pub mod text;

/// Knobs the handlers need from the config.
#[derive(Clone, Debug)]
pub struct HandlerSettings {
    pub greeting_command: String,
    pub login_domain: String,
    pub service_name: String,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            greeting_command: "/start".to_string(),
            login_domain: "gmail.com".to_string(),
            service_name: "Amur Restoran".to_string(),
        }
    }
}

/// Collaborators shared by all handlers.
#[derive(Clone)]
pub struct HandlerDeps {
    pub transport: Arc<dyn TransportClient>,
    pub backend: Arc<dyn BackendClient>,
    pub settings: HandlerSettings,
}

/// Send a reply; failures are logged and swallowed.
///
/// Returns whether the platform accepted the message.
pub(crate) async fn send_best_effort(
    deps: &HandlerDeps,
    chat_id: ChatId,
    text: &str,
    keyboard: Option<&ReplyKeyboard>,
) -> bool {
    match deps.transport.deliver_message(chat_id, text, keyboard).await {
        Ok(()) => {
            tracing::debug!(chat_id = chat_id.0, "reply delivered");
            true
        }
        Err(e) => {
            tracing::warn!(chat_id = chat_id.0, error = %e, "reply delivery failed");
            false
        }
    }
}
