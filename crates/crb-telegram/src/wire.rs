//! Telegram Bot API wire types and their mapping onto core events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crb_core::{
    domain::{ChatId, EventId, UserId},
    messaging::types::{ContactShare, Event, Origin, Payload, ReplyKeyboard},
};

/// Every Bot API response: `{ok, result?, description?, parameters?}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    from: Option<TgUser>,
    chat: TgChat,
    text: Option<String>,
    contact: Option<TgContact>,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    #[serde(default)]
    first_name: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgContact {
    phone_number: String,
    #[serde(default)]
    first_name: String,
    user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButtonMarkup>>,
    resize_keyboard: bool,
    one_time_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButtonMarkup {
    text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    request_contact: bool,
}

impl From<&ReplyKeyboard> for ReplyKeyboardMarkup {
    fn from(kb: &ReplyKeyboard) -> Self {
        Self {
            keyboard: kb
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| KeyboardButtonMarkup {
                            text: b.label.clone(),
                            request_contact: b.request_contact,
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: kb.resize,
            one_time_keyboard: kb.one_time,
        }
    }
}

/// Map one raw update onto a core event.
///
/// Returns `None` only when the update has no usable `update_id` (the cursor cannot
/// move past it anyway). Undecodable messages still yield an event so the cursor
/// advances.
pub(crate) fn update_to_event(raw: &Value) -> Option<Event> {
    let Some(update_id) = raw.get("update_id").and_then(Value::as_i64) else {
        tracing::warn!(update = %truncate(&raw.to_string(), 200), "update without update_id dropped");
        return None;
    };
    let id = EventId(update_id);

    let Some(message) = raw.get("message") else {
        return Some(Event::unroutable(id));
    };
    let message: TgMessage = match serde_json::from_value(message.clone()) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(event_id = update_id, error = %e, "malformed message payload");
            return Some(Event::unroutable(id));
        }
    };
    let Some(from) = message.from else {
        tracing::warn!(event_id = update_id, "message without sender ignored");
        return Some(Event::unroutable(id));
    };

    let payload = if let Some(contact) = message.contact {
        Payload::Contact(ContactShare {
            phone_number: contact.phone_number,
            display_name: contact.first_name,
            sharing_user_id: UserId(contact.user_id.unwrap_or(from.id)),
        })
    } else if let Some(text) = message.text {
        Payload::Text(text)
    } else {
        Payload::Empty
    };

    Some(Event::new(
        id,
        Origin {
            chat_id: ChatId(message.chat.id),
            user_id: UserId(from.id),
            first_name: from.first_name,
            username: from.username,
        },
        payload,
    ))
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_message_maps_to_text_payload() {
        let ev = update_to_event(&json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": {"id": 7, "first_name": "Ali", "username": "ali"},
                "chat": {"id": 70},
                "text": "/start"
            }
        }))
        .unwrap();

        assert_eq!(ev.id, EventId(10));
        assert_eq!(ev.payload, Payload::Text("/start".to_string()));
        let origin = ev.origin.unwrap();
        assert_eq!(origin.chat_id, ChatId(70));
        assert_eq!(origin.user_id, UserId(7));
        assert_eq!(origin.first_name, "Ali");
        assert_eq!(origin.username.as_deref(), Some("ali"));
    }

    #[test]
    fn contact_message_maps_to_contact_payload() {
        let ev = update_to_event(&json!({
            "update_id": 11,
            "message": {
                "message_id": 2,
                "from": {"id": 7, "first_name": "Ali"},
                "chat": {"id": 70},
                "contact": {"phone_number": "+998901234567", "first_name": "Ali", "user_id": 7}
            }
        }))
        .unwrap();

        assert_eq!(
            ev.payload,
            Payload::Contact(ContactShare {
                phone_number: "+998901234567".to_string(),
                display_name: "Ali".to_string(),
                sharing_user_id: UserId(7),
            })
        );
    }

    #[test]
    fn contact_without_user_id_falls_back_to_sender() {
        let ev = update_to_event(&json!({
            "update_id": 12,
            "message": {
                "from": {"id": 99, "first_name": "Bo"},
                "chat": {"id": 1},
                "contact": {"phone_number": "123", "first_name": "Someone"}
            }
        }))
        .unwrap();

        match ev.payload {
            Payload::Contact(c) => assert_eq!(c.sharing_user_id, UserId(99)),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn update_without_message_still_moves_cursor() {
        let ev = update_to_event(&json!({"update_id": 13, "edited_message": {}})).unwrap();
        assert_eq!(ev, Event::unroutable(EventId(13)));
    }

    #[test]
    fn malformed_message_becomes_unroutable() {
        let ev = update_to_event(&json!({"update_id": 14, "message": {"chat": "nope"}})).unwrap();
        assert_eq!(ev, Event::unroutable(EventId(14)));
    }

    #[test]
    fn sticker_has_empty_payload() {
        let ev = update_to_event(&json!({
            "update_id": 15,
            "message": {"from": {"id": 1, "first_name": "A"}, "chat": {"id": 1}, "sticker": {}}
        }))
        .unwrap();
        assert_eq!(ev.payload, Payload::Empty);
        assert!(ev.origin.is_some());
    }

    #[test]
    fn missing_update_id_is_dropped() {
        assert!(update_to_event(&json!({"message": {}})).is_none());
    }

    #[test]
    fn contact_keyboard_serializes_like_the_bot_api() {
        let kb = ReplyKeyboard::request_contact("Share");
        let v = serde_json::to_value(ReplyKeyboardMarkup::from(&kb)).unwrap();
        assert_eq!(
            v,
            json!({
                "keyboard": [[{"text": "Share", "request_contact": true}]],
                "resize_keyboard": true,
                "one_time_keyboard": true
            })
        );
    }
}
