//! Job orchestrator
//!
//! Owns the single optimizer job of a session. Admission (`start`, `stop`)
//! is decided under the job's write lock before any request goes out; stage
//! changes are applied only from event-channel messages, except for the
//! request-level outcomes that close a job (`error`, `aborted`, transport
//! failure).

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use shared::{component_info, component_warn, ComponentId, DownloadableFile, Stage};
use crate::config::ClientConfig;
use crate::core::{GenerationPayload, PayloadPipeline};
use crate::error::{ClientError, ClientResult};
use crate::state::{JobState, is_plain_file_name};
use crate::traits::ScheduleApi;
use crate::types::{GenerateAck, JobNotice, JobSnapshot, ScheduleData, SelectionSet, StartOutcome, StopOutcome};

const NOTICE_CAPACITY: usize = 256;

pub struct JobOrchestrator {
    api: Arc<dyn ScheduleApi>,
    pipeline: PayloadPipeline,
    job: Arc<RwLock<JobState>>,
    notices: broadcast::Sender<JobNotice>,
}

impl JobOrchestrator {
    pub fn new(api: Arc<dyn ScheduleApi>, config: &ClientConfig) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            api,
            pipeline: PayloadPipeline::new(config.pipeline.clone()),
            job: Arc::new(RwLock::new(JobState::new(
                config.progress_log_capacity,
                config.diagnostic_log_capacity,
            ))),
            notices,
        }
    }

    /// Receive notices emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<JobNotice> {
        self.notices.subscribe()
    }

    pub async fn snapshot(&self) -> JobSnapshot {
        self.job.read().await.snapshot()
    }

    pub async fn is_active(&self) -> bool {
        self.job.read().await.is_active()
    }

    /// Build the payload from the user's selections and start the job
    pub async fn generate(&self, data: &ScheduleData, selection: &SelectionSet) -> ClientResult<StartOutcome> {
        let payload = self.pipeline.build(data, selection).map_err(|e| {
            component_warn!(ComponentId::Pipeline, "🚫 Payload refused: {}", e);
            ClientError::from(e)
        })?;
        self.start(&payload).await
    }

    pub async fn start(&self, payload: &GenerationPayload) -> ClientResult<StartOutcome> {
        {
            let mut job = self.job.write().await;
            match job.admit() {
                Ok(notices) => self.publish(notices),
                Err(stage) => {
                    component_warn!(ComponentId::Job, "🚫 Start refused, job busy in {}", stage);
                    return Err(ClientError::JobAlreadyActive { stage });
                }
            }
        }

        let result = self.api.generate(payload).await;

        let mut job = self.job.write().await;
        job.submitting = false;
        match result {
            Ok(GenerateAck::Accepted) => {
                component_info!(ComponentId::Job, "✅ Generation accepted, waiting for status events");
                Ok(StartOutcome::Accepted)
            }
            Ok(GenerateAck::Aborted) => {
                component_info!(ComponentId::Job, "🛑 Generation aborted by the server");
                let notices = job.force_terminal(Stage::Aborted, "Generation aborted".to_string());
                self.publish(notices);
                Ok(StartOutcome::Aborted)
            }
            Ok(GenerateAck::Rejected { error, message }) => {
                component_warn!(ComponentId::Job, "❌ Generation rejected: {}: {}", error, message);
                let notices = job.force_terminal(Stage::Error, format!("{error}: {message}"));
                self.publish(notices);
                Err(ClientError::JobRejected { error, message })
            }
            Err(e) => {
                component_warn!(ComponentId::Job, "❌ Generate request failed: {}", e);
                let notices = job.force_terminal(Stage::Error, e.to_string());
                self.publish(notices);
                Err(e)
            }
        }
    }

    /// Ask the server to stop; the job ends when `ABORTED` arrives
    pub async fn stop(&self) -> ClientResult<StopOutcome> {
        {
            let mut job = self.job.write().await;
            if job.stop_pending {
                return Ok(StopOutcome::AlreadyStopping);
            }
            if !job.is_active() && !job.submitting {
                return Ok(StopOutcome::NotRunning);
            }
            job.stop_pending = true;
        }

        component_info!(ComponentId::Job, "🛑 Requesting stop");
        if let Err(e) = self.api.stop_generation().await {
            component_warn!(ComponentId::Job, "❌ Stop request failed: {}", e);
            self.job.write().await.stop_pending = false;
            return Err(e);
        }
        Ok(StopOutcome::Requested)
    }

    /// Return a finished job to IDLE
    pub async fn dismiss(&self) -> ClientResult<()> {
        let mut job = self.job.write().await;
        match job.dismiss() {
            Some(notices) => {
                self.publish(notices);
                Ok(())
            }
            None => Err(ClientError::InvalidJobState {
                details: format!("cannot dismiss a job in {}", job.stage),
            }),
        }
    }

    pub async fn process_results(&self) -> ClientResult<serde_json::Value> {
        let stage = self.job.read().await.stage;
        if stage != Stage::Completed {
            return Err(ClientError::InvalidJobState {
                details: format!("results can only be processed after completion, job is {stage}"),
            });
        }
        self.api.process_results().await
    }

    /// Download a file announced by the server
    pub async fn download(&self, file_name: &str) -> ClientResult<(DownloadableFile, Vec<u8>)> {
        if !is_plain_file_name(file_name) {
            return Err(ClientError::InvalidJobState {
                details: format!("{file_name:?} is not a plain file name"),
            });
        }
        let file = self
            .job
            .read()
            .await
            .downloadable_files
            .get(file_name)
            .cloned()
            .ok_or_else(|| ClientError::InvalidJobState {
                details: format!("{file_name} is not a downloadable file"),
            })?;
        let bytes = self.api.download(&file.name).await?;
        Ok((file, bytes))
    }

    /// Apply a `ga_status` stage; unknown names are ignored
    pub(crate) async fn on_stage_event(&self, stage: &str, message: String, progress: Option<f64>) {
        let stage = match stage.parse::<Stage>() {
            Ok(stage) => stage,
            Err(e) => {
                component_warn!(ComponentId::Job, "⚠️ Ignoring status event: {}", e);
                return;
            }
        };
        let notices = self.job.write().await.apply_stage(stage, message, progress);
        self.publish(notices);
    }

    /// `ga_error`: fail the job whatever its stage
    pub(crate) async fn on_error(&self, description: String) {
        component_warn!(ComponentId::Job, "❌ Optimizer error: {}", description);
        let notices = self.job.write().await.fail(description);
        self.publish(notices);
    }

    /// `ga_results`: replace the registry wholesale
    pub(crate) async fn on_results(&self, files: Vec<DownloadableFile>) {
        let count = files.len();
        self.job.write().await.downloadable_files.replace_all(files);
        self.publish(vec![JobNotice::ResultsSynced { count }]);
    }

    /// Mutate the job under the write lock and publish the returned notices
    pub(crate) async fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut JobState) -> Vec<JobNotice>,
    {
        let notices = apply(&mut *self.job.write().await);
        self.publish(notices);
    }

    fn publish(&self, notices: Vec<JobNotice>) {
        for notice in notices {
            // No subscribers is fine; the snapshot still reflects the job
            let _ = self.notices.send(notice);
        }
    }
}
