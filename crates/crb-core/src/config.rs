use std::{collections::HashMap, env, fs, net::SocketAddr, path::Path, time::Duration};

use crate::{
    errors::Error,
    handlers::HandlerSettings,
    poller::PollConfig,
    Result,
};

/// Typed configuration, sourced from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_base: String,

    // Firebase
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    pub firebase_access_token: Option<String>,
    pub firestore_base_url: String,
    pub identity_toolkit_base_url: String,
    pub firestore_collection: String,

    // Registration flow
    pub login_domain: String,
    pub service_name: String,
    pub greeting_command: String,

    // Polling
    pub poll_interval: Duration,
    pub poll_backoff: Duration,
    pub http_timeout: Duration,

    // Control surface
    pub control_addr: SocketAddr,
    pub autostart: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_with(Path::new(".env"), env_str)
    }

    /// Process values win over the dotenv file; the process env is never mutated.
    pub fn load_with(dotenv: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = read_dotenv(dotenv);
        Self::from_lookup(|key: &str| env(key).or_else(|| file.get(key).cloned()))
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let firebase_project_id = get("FIREBASE_PROJECT_ID").ok_or_else(|| {
            Error::Config("FIREBASE_PROJECT_ID environment variable is required".to_string())
        })?;
        let firebase_api_key = get("FIREBASE_API_KEY").ok_or_else(|| {
            Error::Config("FIREBASE_API_KEY environment variable is required".to_string())
        })?;

        let telegram_api_base =
            get("TELEGRAM_API_BASE").unwrap_or_else(|| "https://api.telegram.org".to_string());
        let firebase_access_token = get("FIREBASE_ACCESS_TOKEN");
        let firestore_base_url = get("FIRESTORE_BASE_URL")
            .unwrap_or_else(|| "https://firestore.googleapis.com".to_string());
        let identity_toolkit_base_url = get("IDENTITY_TOOLKIT_BASE_URL")
            .unwrap_or_else(|| "https://identitytoolkit.googleapis.com".to_string());
        let firestore_collection =
            get("FIRESTORE_COLLECTION").unwrap_or_else(|| "userInfo".to_string());

        let login_domain = get("LOGIN_DOMAIN")
            .map(|d| d.trim().trim_start_matches('@').to_string())
            .unwrap_or_else(|| "gmail.com".to_string());
        let service_name = get("SERVICE_NAME").unwrap_or_else(|| "Amur Restoran".to_string());
        let greeting_command = get("GREETING_COMMAND").unwrap_or_else(|| "/start".to_string());

        let poll_interval = Duration::from_millis(env_u64(&get, "POLL_INTERVAL_MS")?.unwrap_or(2_000));
        let poll_backoff = Duration::from_millis(env_u64(&get, "POLL_BACKOFF_MS")?.unwrap_or(5_000));
        let http_timeout = Duration::from_millis(env_u64(&get, "HTTP_TIMEOUT_MS")?.unwrap_or(10_000));

        let control_addr = get("CONTROL_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("CONTROL_ADDR is not a socket address: {e}")))?;
        let autostart = env_bool(&get, "AUTOSTART").unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            telegram_api_base,
            firebase_project_id,
            firebase_api_key,
            firebase_access_token,
            firestore_base_url,
            identity_toolkit_base_url,
            firestore_collection,
            login_domain,
            service_name,
            greeting_command,
            poll_interval,
            poll_backoff,
            http_timeout,
            control_addr,
            autostart,
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
            backoff: self.poll_backoff,
        }
    }

    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            greeting_command: self.greeting_command.clone(),
            login_domain: self.login_domain.clone(),
            service_name: self.service_name.clone(),
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// `KEY=value` pairs from a dotenv file; missing or unreadable files yield nothing.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    fs::read_to_string(path)
        .map(|contents| parse_dotenv(&contents))
        .unwrap_or_default()
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim().trim_start_matches("export ").trim();
            (!key.is_empty()).then(|| (key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}

fn env_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    get(key)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{key} must be an unsigned integer: {e}")))
        })
        .transpose()
}

fn env_bool(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    get(key).map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
