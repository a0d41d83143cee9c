use crate::domain::{ChatId, EventId, UserId};

/// One inbound notification from the messaging platform.
///
/// `origin` is `None` when the platform update carried no message (edits, callbacks,
/// membership changes, undecodable messages). Such events still advance the cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub origin: Option<Origin>,
    pub payload: Payload,
}

/// Who sent the message and where to reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Origin {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Text(String),
    Contact(ContactShare),
    /// Nothing actionable (stickers, photos, service messages...).
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactShare {
    pub phone_number: String,
    pub display_name: String,
    pub sharing_user_id: UserId,
}

impl Event {
    pub fn new(id: EventId, origin: Origin, payload: Payload) -> Self {
        Self {
            id,
            origin: Some(origin),
            payload,
        }
    }

    /// An event that only exists to move the cursor forward.
    pub fn unroutable(id: EventId) -> Self {
        Self {
            id,
            origin: None,
            payload: Payload::Empty,
        }
    }
}

/// Reply keyboard attached to an outgoing message.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<KeyboardButton>>,
    pub resize: bool,
    pub one_time: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardButton {
    pub label: String,
    pub request_contact: bool,
}

impl ReplyKeyboard {
    /// A single resized, one-time button asking the user to share their contact.
    pub fn request_contact(label: impl Into<String>) -> Self {
        Self {
            rows: vec![vec![KeyboardButton {
                label: label.into(),
                request_contact: true,
            }]],
            resize: true,
            one_time: true,
        }
    }
}
