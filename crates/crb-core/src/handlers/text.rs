use crate::{domain::ChatId, formatting::escape_html};

use super::{send_best_effort, HandlerDeps};

/// Echo a free-form text message back as a receipt.
pub async fn handle_text(deps: &HandlerDeps, chat_id: ChatId, text: &str) {
    tracing::info!(chat_id = chat_id.0, len = text.len(), "text message received");
    let reply = format!("Your message was received: {}", escape_html(text));
    send_best_effort(deps, chat_id, &reply, None).await;
}
