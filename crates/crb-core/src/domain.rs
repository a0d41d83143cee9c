use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Monotonically increasing id the transport assigns to every inbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub i64);

impl EventId {
    pub fn next(self) -> EventId {
        EventId(self.0.saturating_add(1))
    }
}

/// Record persisted once per registering user.
///
/// Field names on the wire match the layout the backend already stores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub phone_number: String,
    #[serde(rename = "first_name")]
    pub display_name: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "email")]
    pub login_identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}
