//! Shared error types for the schedule client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Unknown stage: {input}")]
    UnknownStage { input: String },

    #[error("Unknown export event type: {input}")]
    UnknownExportEvent { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Message protocol error: {message}")]
    ProtocolError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
