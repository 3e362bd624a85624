//! Core types used throughout the schedule client

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SharedError;

/// Component identifier attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// HTTP facade and credential refresh
    Auth,
    /// Job orchestrator
    Job,
    /// Event stream multiplexer
    Events,
    /// Input transformation pipeline
    Pipeline,
    /// Command line front end
    Cli,
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Auth => write!(f, "auth"),
            ComponentId::Job => write!(f, "job"),
            ComponentId::Events => write!(f, "events"),
            ComponentId::Pipeline => write!(f, "pipeline"),
            ComponentId::Cli => write!(f, "cli"),
        }
    }
}

/// Lifecycle stage of the optimizer job, as reported by `ga_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Idle,
    Start,
    LoadingData,
    ProcessingData,
    InitializingPopulation,
    RunningGa,
    GeneratingSemesterSchedule,
    ExportingExcel,
    GeneratingViews,
    Stopping,
    Completed,
    Aborted,
    Error,
}

impl Stage {
    /// Every stage, in declaration order
    pub const ALL: [Stage; 13] = [
        Stage::Idle,
        Stage::Start,
        Stage::LoadingData,
        Stage::ProcessingData,
        Stage::InitializingPopulation,
        Stage::RunningGa,
        Stage::GeneratingSemesterSchedule,
        Stage::ExportingExcel,
        Stage::GeneratingViews,
        Stage::Stopping,
        Stage::Completed,
        Stage::Aborted,
        Stage::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::Start => "START",
            Stage::LoadingData => "LOADING_DATA",
            Stage::ProcessingData => "PROCESSING_DATA",
            Stage::InitializingPopulation => "INITIALIZING_POPULATION",
            Stage::RunningGa => "RUNNING_GA",
            Stage::GeneratingSemesterSchedule => "GENERATING_SEMESTER_SCHEDULE",
            Stage::ExportingExcel => "EXPORTING_EXCEL",
            Stage::GeneratingViews => "GENERATING_VIEWS",
            Stage::Stopping => "STOPPING",
            Stage::Completed => "COMPLETED",
            Stage::Aborted => "ABORTED",
            Stage::Error => "ERROR",
        }
    }

    /// Whether the run has finished (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed | Stage::Aborted | Stage::Error)
    }

    /// Whether a job is running; drives the progress surface
    pub fn is_active(&self) -> bool {
        !matches!(self, Stage::Idle | Stage::Completed | Stage::Aborted | Stage::Error)
    }

    /// Position along the forward pipeline, `None` for idle, stopping and terminal stages
    fn pipeline_position(&self) -> Option<u8> {
        match self {
            Stage::Start => Some(1),
            Stage::LoadingData => Some(2),
            Stage::ProcessingData => Some(3),
            Stage::InitializingPopulation => Some(4),
            Stage::RunningGa => Some(5),
            Stage::GeneratingSemesterSchedule => Some(6),
            Stage::ExportingExcel => Some(7),
            Stage::GeneratingViews => Some(8),
            _ => None,
        }
    }

    /// Whether `next` is reachable from `self` along the stage DAG.
    ///
    /// Re-entering the current active stage is allowed so that repeated
    /// status messages can refresh the message and progress.
    pub fn can_transition_to(&self, next: Stage) -> bool {
        if next == Stage::Idle {
            return false;
        }

        match self {
            Stage::Idle | Stage::Completed | Stage::Aborted | Stage::Error => !next.is_terminal(),
            Stage::Stopping => next == Stage::Stopping || next.is_terminal(),
            current => match (current.pipeline_position(), next.pipeline_position()) {
                (Some(from), Some(to)) => to >= from,
                _ => next == Stage::Stopping || next.is_terminal(),
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| SharedError::UnknownStage { input: s.to_string() })
    }
}

/// Sub-protocol of `ga_export` messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportEventType {
    Started,
    SemesterExportStart,
    SemesterProcessingStart,
    ExcelExportSuccess,
    CombinedJsonExportSuccess,
    ExportComplete,
    SemesterProcessingError,
    ExcelExportError,
}

impl ExportEventType {
    pub const ALL: [ExportEventType; 8] = [
        ExportEventType::Started,
        ExportEventType::SemesterExportStart,
        ExportEventType::SemesterProcessingStart,
        ExportEventType::ExcelExportSuccess,
        ExportEventType::CombinedJsonExportSuccess,
        ExportEventType::ExportComplete,
        ExportEventType::SemesterProcessingError,
        ExportEventType::ExcelExportError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportEventType::Started => "STARTED",
            ExportEventType::SemesterExportStart => "SEMESTER_EXPORT_START",
            ExportEventType::SemesterProcessingStart => "SEMESTER_PROCESSING_START",
            ExportEventType::ExcelExportSuccess => "EXCEL_EXPORT_SUCCESS",
            ExportEventType::CombinedJsonExportSuccess => "COMBINED_JSON_EXPORT_SUCCESS",
            ExportEventType::ExportComplete => "EXPORT_COMPLETE",
            ExportEventType::SemesterProcessingError => "SEMESTER_PROCESSING_ERROR",
            ExportEventType::ExcelExportError => "EXCEL_EXPORT_ERROR",
        }
    }
}

impl fmt::Display for ExportEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportEventType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        ExportEventType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SharedError::UnknownExportEvent { input: s.to_string() })
    }
}
