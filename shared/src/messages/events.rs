//! Event channel messages
//!
//! Every frame on the channel is a JSON object `{"event": <name>, "data": <payload>}`.
//! Stage and export-type fields stay raw strings on the wire so that an
//! unknown value from a newer server can be logged instead of failing the
//! whole frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages pushed by the server
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    GaStatus(StatusEvent),
    GaProgress(ProgressEvent),
    GaExport(ExportEvent),
    GaLog(LogEvent),
    GaError(ErrorEvent),
    GaResults(ResultsEvent),
}

impl ServerEvent {
    /// Wire name of the message kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::GaStatus(_) => "ga_status",
            ServerEvent::GaProgress(_) => "ga_progress",
            ServerEvent::GaExport(_) => "ga_export",
            ServerEvent::GaLog(_) => "ga_log",
            ServerEvent::GaError(_) => "ga_error",
            ServerEvent::GaResults(_) => "ga_results",
        }
    }
}

/// Messages sent by the client
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Ask the server to replay the current downloadable-files snapshot
    GetResults,
}

/// Authoritative stage transition
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusEvent {
    pub stage: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GenerationInfo {
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FitnessMetrics {
    #[serde(default)]
    pub best_fitness: f64,
    #[serde(default)]
    pub average_fitness: f64,
    #[serde(default)]
    pub has_improvement: bool,
    #[serde(default)]
    pub hard_violations: Option<u32>,
    #[serde(default)]
    pub soft_violations: Option<u32>,
}

/// Optimizer telemetry, one per reported generation
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProgressEvent {
    #[serde(default)]
    pub generation_info: GenerationInfo,
    #[serde(default)]
    pub fitness_metrics: FitnessMetrics,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Export sub-protocol message, keyed by `event_type`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExportEvent {
    pub event_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Free-text optimizer diagnostics
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LogEvent {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
}

/// Fatal optimizer failure
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorEvent {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEvent {
    /// Human readable description, preferring the detailed message
    pub fn description(&self) -> String {
        match (&self.message, self.error.is_empty()) {
            (Some(message), true) => message.clone(),
            (Some(message), false) => format!("{}: {}", self.error, message),
            (None, false) => self.error.clone(),
            (None, true) => "Unknown optimizer error".to_string(),
        }
    }
}

/// Snapshot of every artifact the server currently offers
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ResultsEvent {
    #[serde(default)]
    pub files: Vec<DownloadableFile>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Excel,
    Json,
    #[serde(other)]
    Other,
}

/// Artifact produced by a run, downloadable by name
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DownloadableFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    pub timestamp: DateTime<Utc>,
}
