use chrono::Utc;

use crate::{
    credentials::Credentials,
    domain::{ChatId, UserRecord},
    formatting::escape_html,
    messaging::types::ContactShare,
    ports::ProvisionOutcome,
};

use super::{send_best_effort, HandlerDeps};

/// What happened to each step of a registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationReport {
    pub record_saved: bool,
    pub account: AccountStatus,
    pub reply_sent: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountStatus {
    Created,
    AlreadyExisted,
    Failed,
}

pub fn confirmation_text(creds: &Credentials) -> String {
    format!(
        "✅ Your details have been saved!\n\n📧 Login: {}\n🔐 Password: {}\n\nYou can now sign in to the app with these credentials.",
        escape_html(&creds.login_identifier),
        escape_html(&creds.secret)
    )
}

/// Register the sharing user: persist the record, provision the account, confirm.
///
/// Steps 1-2 are independent: a failed record write does not skip provisioning. The
/// confirmation (with the derived credentials in clear text) is sent regardless of
/// either outcome.
pub async fn handle_contact(
    deps: &HandlerDeps,
    chat_id: ChatId,
    contact: &ContactShare,
) -> RegistrationReport {
    let user_id = contact.sharing_user_id;
    tracing::info!(
        chat_id = chat_id.0,
        user_id = user_id.0,
        phone = %contact.phone_number,
        "contact received"
    );

    let creds = Credentials::derive(&contact.phone_number, user_id, &deps.settings.login_domain);

    let record = UserRecord {
        phone_number: contact.phone_number.clone(),
        display_name: contact.display_name.clone(),
        user_id: user_id.0,
        created_at: Utc::now(),
        login_identifier: creds.login_identifier.clone(),
        secret: creds.secret.clone(),
    };
    let record_saved = match deps.backend.upsert_record(user_id, &record).await {
        Ok(()) => {
            tracing::info!(user_id = user_id.0, "user record saved");
            true
        }
        Err(e) => {
            tracing::error!(user_id = user_id.0, operation = "upsert_record", error = %e, "failed to save user record");
            false
        }
    };

    let display_name = account_display_name(contact);
    let account = match deps
        .backend
        .provision_account(&creds.login_identifier, &creds.secret, &display_name)
        .await
    {
        Ok(ProvisionOutcome::Created { uid }) => {
            tracing::info!(login = %creds.login_identifier, uid = %uid, "account created");
            AccountStatus::Created
        }
        Ok(ProvisionOutcome::AlreadyExists) => {
            tracing::info!(login = %creds.login_identifier, "account already exists");
            AccountStatus::AlreadyExisted
        }
        Err(e) => {
            tracing::error!(login = %creds.login_identifier, operation = "provision_account", error = %e, "failed to provision account");
            AccountStatus::Failed
        }
    };

    let reply_sent = send_best_effort(deps, chat_id, &confirmation_text(&creds), None).await;

    RegistrationReport {
        record_saved,
        account,
        reply_sent,
    }
}

fn account_display_name(contact: &ContactShare) -> String {
    let name = contact.display_name.trim();
    if name.is_empty() {
        format!("User_{}", contact.sharing_user_id.0)
    } else {
        name.to_string()
    }
}
