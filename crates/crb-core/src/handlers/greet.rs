use crate::{
    domain::{ChatId, UserId},
    formatting::escape_html,
    messaging::types::ReplyKeyboard,
};

use super::{send_best_effort, HandlerDeps};

const SHARE_CONTACT_LABEL: &str = "📱 Share phone number";

pub fn welcome_text(display_name: &str, service_name: &str) -> String {
    format!(
        "🤖 Hello, {}!\n\nWelcome to the {} bot!\n\nShare your phone number to register.",
        escape_html(display_name),
        escape_html(service_name)
    )
}

/// Greet the user and ask them to share their contact.
///
/// No backend calls; safe to repeat for a redelivered event.
pub async fn handle_greet(
    deps: &HandlerDeps,
    chat_id: ChatId,
    user_id: UserId,
    display_name: &str,
) {
    let keyboard = ReplyKeyboard::request_contact(SHARE_CONTACT_LABEL);
    let text = welcome_text(display_name, &deps.settings.service_name);

    if send_best_effort(deps, chat_id, &text, Some(&keyboard)).await {
        tracing::info!(chat_id = chat_id.0, user_id = user_id.0, "welcome sent");
    }
}
