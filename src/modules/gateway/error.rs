use thiserror::Error;

/// Errors raised while talking to the hosted backend (tables or object storage)
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response (DNS, TLS, connection reset, ...)
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered, but the payload did not match the expected shape
    #[error("Unexpected gateway payload: {0}")]
    Decode(String),

    /// A single-row operation matched no row
    #[error("No matching row in '{0}'")]
    NotFound(String),

    /// Object storage failure (upload, signing, public URL)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}
