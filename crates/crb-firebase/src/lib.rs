//! Firebase adapter (record persistence + account provisioning).
//!
//! Uses the Firestore REST API for user records and the Identity Toolkit
//! `accounts:signUp` endpoint for email/password accounts.

use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::{json, Value};

use crb_core::{
    config::Config,
    domain::{UserId, UserRecord},
    errors::Error,
    ports::{BackendClient, ProvisionOutcome},
    Result,
};

#[derive(Clone, Debug)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub api_key: String,
    /// OAuth bearer token for Firestore; without it requests go through the API key
    /// and are subject to security rules.
    pub access_token: Option<String>,
    pub firestore_base_url: String,
    pub identity_toolkit_base_url: String,
    pub collection: String,
    pub timeout: Duration,
}

impl FirebaseConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            project_id: cfg.firebase_project_id.clone(),
            api_key: cfg.firebase_api_key.clone(),
            access_token: cfg.firebase_access_token.clone(),
            firestore_base_url: cfg.firestore_base_url.clone(),
            identity_toolkit_base_url: cfg.identity_toolkit_base_url.clone(),
            collection: cfg.firestore_collection.clone(),
            timeout: cfg.http_timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FirebaseBackend {
    cfg: FirebaseConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "localId", default)]
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

impl FirebaseBackend {
    pub fn new(cfg: FirebaseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::Config(format!("firebase http client: {e}")))?;
        Ok(Self { cfg, http })
    }

    fn document_url(&self, key: UserId) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.cfg.firestore_base_url.trim_end_matches('/'),
            self.cfg.project_id,
            self.cfg.collection,
            key.0
        )
    }

    fn sign_up_url(&self) -> String {
        format!(
            "{}/v1/accounts:signUp",
            self.cfg.identity_toolkit_base_url.trim_end_matches('/')
        )
    }

    fn map_err(op: &str, e: reqwest::Error) -> Error {
        Error::Backend(format!("{op} request error: {}", e.without_url()))
    }
}

/// Firestore typed-value encoding of a user record.
fn record_fields(record: &UserRecord) -> Value {
    json!({
        "phone_number": { "stringValue": record.phone_number },
        "first_name": { "stringValue": record.display_name },
        "user_id": { "integerValue": record.user_id.to_string() },
        "created_at": {
            "timestampValue": record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
        },
        "email": { "stringValue": record.login_identifier },
        "password": { "stringValue": record.secret },
    })
}

/// Google APIs report errors as `{"error": {"message": "EMAIL_EXISTS", ...}}`;
/// some messages carry a suffix (`WEAK_PASSWORD : ...`).
fn error_code(body: &str) -> Option<String> {
    let parsed: GoogleErrorBody = serde_json::from_str(body).ok()?;
    let code = parsed
        .error
        .message
        .split(':')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

fn body_snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[async_trait]
impl BackendClient for FirebaseBackend {
    async fn upsert_record(&self, key: UserId, record: &UserRecord) -> Result<()> {
        // PATCH without an update mask replaces the whole document (create or overwrite).
        let mut req = self
            .http
            .patch(self.document_url(key))
            .json(&json!({ "fields": record_fields(record) }));
        req = match &self.cfg.access_token {
            Some(token) => req.bearer_auth(token),
            None => req.query(&[("key", self.cfg.api_key.as_str())]),
        };

        let resp = req
            .send()
            .await
            .map_err(|e| Self::map_err("firestore upsert", e))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "firestore upsert failed for {}: {status} {}",
                key.0,
                body_snippet(&body)
            )));
        }

        tracing::debug!(user_id = key.0, collection = %self.cfg.collection, "firestore document written");
        Ok(())
    }

    async fn provision_account(
        &self,
        login_identifier: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<ProvisionOutcome> {
        let resp = self
            .http
            .post(self.sign_up_url())
            .query(&[("key", self.cfg.api_key.as_str())])
            .json(&json!({
                "email": login_identifier,
                "password": secret,
                "displayName": display_name,
                "returnSecureToken": false,
            }))
            .send()
            .await
            .map_err(|e| Self::map_err("accounts:signUp", e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Self::map_err("accounts:signUp", e))?;

        if status.is_success() {
            let parsed: SignUpResponse = serde_json::from_str(&body).map_err(|e| {
                Error::Backend(format!("accounts:signUp returned an unreadable body: {e}"))
            })?;
            return Ok(ProvisionOutcome::Created {
                uid: parsed.local_id,
            });
        }

        match error_code(&body).as_deref() {
            Some("EMAIL_EXISTS") => Ok(ProvisionOutcome::AlreadyExists),
            Some(code) => Err(Error::Backend(format!(
                "accounts:signUp failed for {login_identifier}: {status} {code}"
            ))),
            None => Err(Error::Backend(format!(
                "accounts:signUp failed for {login_identifier}: {status} {}",
                body_snippet(&body)
            ))),
        }
    }
}
