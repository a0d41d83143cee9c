//! Deterministic credential derivation for newly registered users.
//!
//! NOTE: the secret is derived from the public Telegram user id, so it is NOT a
//! secure credential. The rule is kept as-is because existing accounts were
//! provisioned with it.

use crate::domain::UserId;

const SECRET_LEN: usize = 6;
const SECRET_MODULUS: u64 = 1_000_000;

/// Login/secret pair handed to the backend and echoed back to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub login_identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn derive(phone_number: &str, user_id: UserId, domain: &str) -> Self {
        Self {
            login_identifier: derive_login(phone_number, domain),
            secret: derive_secret(user_id),
        }
    }
}

/// `<phone>@<domain>`; the phone number is used verbatim.
pub fn derive_login(phone_number: &str, domain: &str) -> String {
    format!("{phone_number}@{domain}")
}

/// Last six decimal digits of the user id, zero-padded on the left.
///
/// Negative ids (never issued by Telegram for users) use their absolute value.
pub fn derive_secret(user_id: UserId) -> String {
    let tail = user_id.0.unsigned_abs() % SECRET_MODULUS;
    format!("{tail:0width$}", width = SECRET_LEN)
}
