use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RedmerceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("A reply is still pending for this session")]
    SessionBusy,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RedmerceError {
    fn from(e: serde_json::Error) -> Self {
        RedmerceError::Serialization(e.to_string())
    }
}
