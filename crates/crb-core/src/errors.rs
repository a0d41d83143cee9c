/// Core error type for the bridge.
///
/// Adapter crates map their specific errors into this type so the polling loop and
/// the handlers can treat failures uniformly (log, back off, carry on).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Poll/send failure: network error, non-2xx status or `ok: false` envelope.
    #[error("transport error: {0}")]
    Transport(String),

    /// Record upsert or account provisioning failure.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

pub type Result<T> = std::result::Result<T, Error>;
