//! Type definitions for the schedule client
//!
//! This module contains the data types, enums and structs used by the client
//! that are not service traits: user selections, job outcomes, notices and
//! read-only job snapshots handed to the presentation layer.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientResult;

use shared::{
    Class, DownloadableFile, ExportEventType, Lecturer, ProgressEvent, Program, Room, Semester,
    Stage, Subject, TimeSlot,
};

/// Why the user is being sent back to the login page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginReason {
    AccessDenied,
    SessionExpired,
}

impl LoginReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginReason::AccessDenied => "access_denied",
            LoginReason::SessionExpired => "session_expired",
        }
    }
}

impl fmt::Display for LoginReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immediate answer of the generate endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateAck {
    /// Job accepted; stages will follow on the event channel
    Accepted,
    /// Server cancelled the job before it started
    Aborted,
    /// Server refused the job
    Rejected { error: String, message: String },
}

/// Result of a successful `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted,
    /// Cancelled by the server or the user; not a failure
    Aborted,
}

/// Result of a `stop` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Stop request sent; the job ends when `ABORTED` arrives
    Requested,
    /// A stop request is already outstanding
    AlreadyStopping,
    /// No job is running
    NotRunning,
}

/// Severity of a notice, for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Presentation-facing notification emitted by the job orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum JobNotice {
    StageChanged { stage: Stage, message: String, progress: u8 },
    VisibilityChanged { active: bool },
    Completed { message: String },
    Aborted { message: String },
    Failed { message: String },
    Improvement { generation: u32, best_fitness: f64 },
    ExportProgress { event_type: ExportEventType, message: String },
    FileReady { file: DownloadableFile },
    ExportFailed { event_type: ExportEventType, message: String },
    ResultsSynced { count: usize },
}

impl JobNotice {
    pub fn level(&self) -> AlertLevel {
        match self {
            JobNotice::Completed { .. } | JobNotice::FileReady { .. } => AlertLevel::Success,
            JobNotice::Improvement { .. } => AlertLevel::Success,
            JobNotice::ExportProgress { event_type: ExportEventType::ExportComplete, .. } => AlertLevel::Success,
            JobNotice::Aborted { .. } => AlertLevel::Warning,
            JobNotice::Failed { .. } | JobNotice::ExportFailed { .. } => AlertLevel::Error,
            JobNotice::StageChanged { .. }
            | JobNotice::VisibilityChanged { .. }
            | JobNotice::ExportProgress { .. }
            | JobNotice::ResultsSynced { .. } => AlertLevel::Info,
        }
    }
}

impl fmt::Display for JobNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobNotice::StageChanged { stage, message, progress } => {
                write!(f, "[{stage} {progress}%] {message}")
            }
            JobNotice::VisibilityChanged { active: true } => write!(f, "Progress opened"),
            JobNotice::VisibilityChanged { active: false } => write!(f, "Progress closed"),
            JobNotice::Completed { message } => write!(f, "Schedule generated: {message}"),
            JobNotice::Aborted { message } => write!(f, "Generation stopped: {message}"),
            JobNotice::Failed { message } => write!(f, "Generation failed: {message}"),
            JobNotice::Improvement { generation, best_fitness } => {
                write!(f, "New best schedule at generation {generation} (fitness {best_fitness:.4})")
            }
            JobNotice::ExportProgress { event_type, message } => write!(f, "{event_type}: {message}"),
            JobNotice::FileReady { file } => write!(f, "File ready: {}", file.name),
            JobNotice::ExportFailed { event_type, message } => write!(f, "{event_type}: {message}"),
            JobNotice::ResultsSynced { count } => write!(f, "{count} result file(s) available"),
        }
    }
}

/// Read-only copy of the job handed to the presentation layer
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub stage: Stage,
    pub is_active: bool,
    pub progress: u8,
    pub message: String,
    pub progress_log: Vec<String>,
    pub diagnostic_log: Vec<String>,
    pub progress_telemetry: Option<ProgressEvent>,
    pub downloadable_files: Vec<DownloadableFile>,
    pub last_error: Option<String>,
    pub submitting: bool,
    pub stop_pending: bool,
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Selection for one entity collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every record
    #[default]
    All,
    /// Only the listed ids; an empty set selects nothing
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, id: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(ids) => ids.contains(id),
        }
    }
}

/// User selections for the four primary collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    pub programs: Selection,
    pub rooms: Selection,
    pub lecturers: Selection,
    pub classes: Selection,
}

/// Raw entity collections as loaded from the CRUD endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleData {
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub lecturers: Vec<Lecturer>,
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub semesters: Vec<Semester>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

impl ScheduleData {
    /// Load entity collections exported from the admin screens as one JSON document
    pub async fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
