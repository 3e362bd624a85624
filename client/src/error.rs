//! Client error types
//!
//! Grouped the way callers react to them: authentication failures are
//! resolved or turned into a login redirect by the HTTP layer, transport
//! failures surface immediately, job failures end the run, validation
//! failures never reach the network.

use thiserror::Error;
use shared::{SharedError, Stage};

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request unauthorized after credential refresh")]
    Unauthorized,

    #[error("Access denied")]
    AccessDenied,

    #[error("Session expired: {reason}")]
    SessionExpired { reason: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request timed out: {endpoint}")]
    Timeout { endpoint: String },

    #[error("Unexpected HTTP status {status} from {endpoint}")]
    HttpStatus { status: u16, endpoint: String },

    #[error("A schedule job is already active (stage {stage})")]
    JobAlreadyActive { stage: Stage },

    #[error("Generation rejected: {error}: {message}")]
    JobRejected { error: String, message: String },

    #[error("Generation failed: {message}")]
    JobFailed { message: String },

    #[error("Job is not in a state that allows this: {details}")]
    InvalidJobState { details: String },

    #[error("Invalid generation input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Event channel error: {message}")]
    Channel { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            let endpoint = error
                .url()
                .map(|url| url.path().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Self::Timeout { endpoint }
        } else {
            Self::Transport { message: error.to_string() }
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(error: url::ParseError) -> Self {
        Self::Config { message: format!("Invalid URL: {error}") }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Channel { message: error.to_string() }
    }
}

/// Reasons the payload pipeline refuses to build a payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No {collection} selected")]
    EmptySelection { collection: &'static str },

    #[error("{from_kind} {from_id} references unknown {to_kind} {to_id}")]
    UnresolvedReference {
        from_kind: &'static str,
        from_id: String,
        to_kind: &'static str,
        to_id: String,
    },

    #[error("Room {room_id} has unknown room type '{label}'")]
    UnknownRoomType { room_id: String, label: String },
}

/// Outcome of a failed credential refresh, shared with every waiting request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("Refresh endpoint answered {status}")]
    Rejected { status: u16 },

    #[error("Refresh request failed: {message}")]
    Transport { message: String },

    #[error("Refresh abandoned before completion")]
    Cancelled,
}

impl From<RefreshFailure> for ClientError {
    fn from(failure: RefreshFailure) -> Self {
        ClientError::SessionExpired { reason: failure.to_string() }
    }
}
