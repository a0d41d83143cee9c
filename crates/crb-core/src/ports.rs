use async_trait::async_trait;

use crate::{
    domain::{UserId, UserRecord},
    Result,
};

/// Result of a provisioning call that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created { uid: String },
    /// The login identifier is already registered. Callers treat this as success.
    AlreadyExists,
}

/// Hexagonal port for the identity/record backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Create or fully replace the record stored under `key`.
    async fn upsert_record(&self, key: UserId, record: &UserRecord) -> Result<()>;

    async fn provision_account(
        &self,
        login_identifier: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<ProvisionOutcome>;
}
