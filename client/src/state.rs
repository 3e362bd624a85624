//! Job state management
//!
//! This module contains the state structures owned by the job orchestrator:
//! the bounded log buffers, the downloadable-files registry and the job
//! itself. Transition methods return the notices they produce; publishing
//! them is left to the orchestrator.

use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::{ComponentId, DownloadableFile, ProgressEvent, Stage, component_info, component_warn};
use crate::types::{JobNotice, JobSnapshot};

/// Fixed-capacity log that drops the oldest half of its entries when full
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() >= self.capacity {
            let dropped = (self.capacity / 2).max(1);
            self.entries.drain(..dropped);
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

/// A bare file name: no directory part, no `..`, nothing that could leave the
/// download directory
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|base| base == name)
}

/// Downloadable artifacts keyed by file name
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Vec<DownloadableFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any entry with the same name. Returns true on replace.
    pub fn upsert(&mut self, file: DownloadableFile) -> bool {
        match self.files.iter_mut().find(|existing| existing.name == file.name) {
            Some(existing) => {
                *existing = file;
                true
            }
            None => {
                self.files.push(file);
                false
            }
        }
    }

    /// Replace the whole registry with a server snapshot
    pub fn replace_all(&mut self, files: Vec<DownloadableFile>) {
        self.files.clear();
        for file in files {
            if !is_plain_file_name(&file.name) {
                component_warn!(ComponentId::Job, "⚠️ Dropping result file with unsafe name {:?}", file.name);
                continue;
            }
            self.upsert(file);
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn get(&self, name: &str) -> Option<&DownloadableFile> {
        self.files.iter().find(|file| file.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn files(&self) -> &[DownloadableFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// The single optimizer job of a client session
#[derive(Debug)]
pub struct JobState {
    pub stage: Stage,
    pub progress: u8,
    pub message: String,
    pub progress_log: BoundedLog<String>,
    pub diagnostic_log: BoundedLog<String>,
    pub progress_telemetry: Option<ProgressEvent>,
    pub downloadable_files: FileRegistry,
    pub last_error: Option<String>,

    // Admission bookkeeping
    pub submitting: bool,
    pub stop_pending: bool,

    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
}

impl JobState {
    pub fn new(progress_log_capacity: usize, diagnostic_log_capacity: usize) -> Self {
        Self {
            stage: Stage::Idle,
            progress: 0,
            message: String::new(),
            progress_log: BoundedLog::new(progress_log_capacity),
            diagnostic_log: BoundedLog::new(diagnostic_log_capacity),
            progress_telemetry: None,
            downloadable_files: FileRegistry::new(),
            last_error: None,
            submitting: false,
            stop_pending: false,
            run_id: None,
            started_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage.is_active()
    }

    /// Stage that blocks a new start, if any
    pub fn start_blocker(&self) -> Option<Stage> {
        if self.is_active() || self.submitting || self.stop_pending {
            Some(self.stage)
        } else {
            None
        }
    }

    /// Apply a stage reported by the server, following the stage DAG
    pub fn apply_stage(&mut self, stage: Stage, message: String, progress: Option<f64>) -> Vec<JobNotice> {
        if !self.stage.can_transition_to(stage) {
            component_warn!(
                ComponentId::Job,
                "⚠️ Ignoring stage {} while in {} (not a valid transition)",
                stage,
                self.stage
            );
            return Vec::new();
        }

        let was_active = self.is_active();
        if !was_active && stage.is_active() {
            self.begin_run();
        }

        self.stage = stage;
        self.message = message.clone();
        match progress {
            Some(value) => self.progress = value.clamp(0.0, 100.0).round() as u8,
            None if stage == Stage::Completed => self.progress = 100,
            None => {}
        }

        let mut notices = vec![JobNotice::StageChanged {
            stage,
            message: message.clone(),
            progress: self.progress,
        }];
        if stage.is_terminal() {
            notices.extend(self.enter_terminal(stage, message));
        }
        if was_active != self.is_active() {
            notices.push(JobNotice::VisibilityChanged { active: self.is_active() });
        }
        notices
    }

    /// Close the job after a request-level outcome, regardless of stage order
    pub fn force_terminal(&mut self, stage: Stage, message: String) -> Vec<JobNotice> {
        debug_assert!(stage.is_terminal());
        let was_active = self.is_active();
        self.stage = stage;
        self.message = message.clone();

        let mut notices = vec![JobNotice::StageChanged {
            stage,
            message: message.clone(),
            progress: self.progress,
        }];
        notices.extend(self.enter_terminal(stage, message));
        if was_active {
            notices.push(JobNotice::VisibilityChanged { active: false });
        }
        notices
    }

    /// Unconditional failure reported by the optimizer; partial outputs are discarded
    pub fn fail(&mut self, description: String) -> Vec<JobNotice> {
        self.downloadable_files.clear();
        self.diagnostic_log.push(format!("[ERROR] {description}"));
        self.force_terminal(Stage::Error, description)
    }

    /// Admit a new submission. A finished job left on screen is returned to
    /// IDLE first so its outcome cannot be mistaken for the new run's.
    pub fn admit(&mut self) -> Result<Vec<JobNotice>, Stage> {
        if let Some(stage) = self.start_blocker() {
            return Err(stage);
        }
        let notices = self.dismiss().unwrap_or_default();
        self.submitting = true;
        Ok(notices)
    }

    /// Return a finished job to IDLE. Logs and files stay inspectable.
    pub fn dismiss(&mut self) -> Option<Vec<JobNotice>> {
        if !self.stage.is_terminal() {
            return None;
        }
        self.stage = Stage::Idle;
        self.progress = 0;
        self.message.clear();
        self.last_error = None;
        Some(vec![JobNotice::StageChanged {
            stage: Stage::Idle,
            message: String::new(),
            progress: 0,
        }])
    }

    fn begin_run(&mut self) {
        let run_id = Uuid::new_v4();
        component_info!(ComponentId::Job, "🆕 Tracking optimizer run {}", run_id);
        self.run_id = Some(run_id);
        self.started_at = Some(Utc::now());
        self.progress = 0;
        self.progress_telemetry = None;
        self.last_error = None;
    }

    fn enter_terminal(&mut self, stage: Stage, message: String) -> Vec<JobNotice> {
        self.stop_pending = false;
        match stage {
            Stage::Completed => {
                self.last_error = None;
                vec![JobNotice::Completed { message }]
            }
            Stage::Aborted => {
                self.last_error = None;
                vec![JobNotice::Aborted { message }]
            }
            Stage::Error => {
                self.last_error = Some(message.clone());
                vec![JobNotice::Failed { message }]
            }
            _ => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            stage: self.stage,
            is_active: self.is_active(),
            progress: self.progress,
            message: self.message.clone(),
            progress_log: self.progress_log.to_vec(),
            diagnostic_log: self.diagnostic_log.to_vec(),
            progress_telemetry: self.progress_telemetry.clone(),
            downloadable_files: self.downloadable_files.files().to_vec(),
            last_error: self.last_error.clone(),
            submitting: self.submitting,
            stop_pending: self.stop_pending,
            run_id: self.run_id,
            started_at: self.started_at,
        }
    }
}
