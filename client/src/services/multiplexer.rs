//! Event stream multiplexer
//!
//! Routes every inbound `ServerEvent` to the job it affects. A `Subscription`
//! owns the background task; dropping it stops dispatching.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use shared::{
    component_debug, component_info, component_warn, ClientEvent, ComponentId, DownloadableFile,
    ExportEvent, ExportEventType, FileKind, LogEvent, ProgressEvent, ServerEvent,
};
use crate::orchestrator::JobOrchestrator;
use crate::state::{JobState, is_plain_file_name};
use crate::traits::{ChannelConnection, EventChannel};
use crate::types::JobNotice;

pub struct EventMultiplexer {
    orchestrator: Arc<JobOrchestrator>,
    channel: Arc<dyn EventChannel>,
    reconnect_interval: Option<Duration>,
}

/// Handle of an attached multiplexer
pub struct Subscription {
    task: Option<JoinHandle<()>>,
    connected: watch::Receiver<bool>,
}

impl Subscription {
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Wait until the channel reports the given connection state
    pub async fn wait_connected(&mut self, connected: bool) -> bool {
        self.connected.wait_for(|state| *state == connected).await.is_ok()
    }

    /// Stop dispatching and wait for the task to finish
    pub async fn close(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl EventMultiplexer {
    pub fn new(
        orchestrator: Arc<JobOrchestrator>,
        channel: Arc<dyn EventChannel>,
        reconnect_interval: Option<Duration>,
    ) -> Self {
        Self {
            orchestrator,
            channel,
            reconnect_interval,
        }
    }

    /// Connect and start dispatching in the background
    pub fn attach(&self) -> Subscription {
        let (connected_tx, connected_rx) = watch::channel(false);
        let task = tokio::spawn(run(
            self.orchestrator.clone(),
            self.channel.clone(),
            self.reconnect_interval,
            connected_tx,
        ));
        Subscription {
            task: Some(task),
            connected: connected_rx,
        }
    }

    /// Route one event to the job
    pub async fn dispatch(&self, event: ServerEvent) {
        dispatch(&self.orchestrator, event).await;
    }
}

async fn run(
    orchestrator: Arc<JobOrchestrator>,
    channel: Arc<dyn EventChannel>,
    reconnect_interval: Option<Duration>,
    connected: watch::Sender<bool>,
) {
    loop {
        match channel.connect().await {
            Ok(ChannelConnection { outbound, mut inbound }) => {
                connected.send_replace(true);
                // Resynchronise the file registry on every (re)connect
                if outbound.send(ClientEvent::GetResults).await.is_err() {
                    component_warn!(ComponentId::Events, "⚠️ Could not request results snapshot");
                }
                while let Some(event) = inbound.recv().await {
                    dispatch(&orchestrator, event).await;
                }
                connected.send_replace(false);
                component_warn!(ComponentId::Events, "🔌 Event channel disconnected");
            }
            Err(e) => {
                component_warn!(ComponentId::Events, "❌ Event channel connection failed: {}", e);
            }
        }

        let Some(interval) = reconnect_interval else {
            break;
        };
        component_info!(ComponentId::Events, "🔄 Reconnecting in {:?}", interval);
        sleep(interval).await;
    }
}

async fn dispatch(orchestrator: &JobOrchestrator, event: ServerEvent) {
    component_debug!(ComponentId::Events, "📨 {}", event.kind());
    match event {
        ServerEvent::GaStatus(status) => {
            orchestrator
                .on_stage_event(&status.stage, status.message, status.progress)
                .await;
        }
        ServerEvent::GaProgress(progress) => {
            orchestrator.update(|job| record_progress(job, progress)).await;
        }
        ServerEvent::GaExport(export) => {
            orchestrator.update(|job| handle_export(job, export)).await;
        }
        ServerEvent::GaLog(log) => {
            orchestrator
                .update(|job| {
                    record_log(job, log);
                    Vec::new()
                })
                .await;
        }
        ServerEvent::GaError(error) => orchestrator.on_error(error.description()).await,
        ServerEvent::GaResults(results) => orchestrator.on_results(results.files).await,
    }
}

fn record_progress(job: &mut JobState, progress: ProgressEvent) -> Vec<JobNotice> {
    let generation = progress.generation_info.current;
    let metrics = &progress.fitness_metrics;

    let mut line = format!(
        "Generation {}/{}: best {:.4}, average {:.4}",
        generation, progress.generation_info.total, metrics.best_fitness, metrics.average_fitness
    );
    if let (Some(hard), Some(soft)) = (metrics.hard_violations, metrics.soft_violations) {
        line.push_str(&format!(", violations {hard} hard / {soft} soft"));
    }
    job.progress_log.push(line);

    let notices = if metrics.has_improvement && generation > 0 {
        vec![JobNotice::Improvement {
            generation,
            best_fitness: metrics.best_fitness,
        }]
    } else {
        Vec::new()
    };
    job.progress_telemetry = Some(progress);
    notices
}

fn handle_export(job: &mut JobState, export: ExportEvent) -> Vec<JobNotice> {
    let event_type = match export.event_type.parse::<ExportEventType>() {
        Ok(event_type) => event_type,
        Err(e) => {
            component_warn!(ComponentId::Events, "⚠️ Ignoring export event: {}", e);
            return Vec::new();
        }
    };

    match event_type {
        ExportEventType::ExcelExportSuccess | ExportEventType::CombinedJsonExportSuccess => {
            let kind = if event_type == ExportEventType::ExcelExportSuccess {
                FileKind::Excel
            } else {
                FileKind::Json
            };
            let Some(file) = exported_file(&export, kind) else {
                component_warn!(ComponentId::Events, "⚠️ {} without a usable file name: {}", event_type, export.message);
                return Vec::new();
            };
            if job.downloadable_files.upsert(file.clone()) {
                component_debug!(ComponentId::Events, "Replaced downloadable file {}", file.name);
            }
            vec![JobNotice::FileReady { file }]
        }
        ExportEventType::SemesterProcessingError | ExportEventType::ExcelExportError => {
            job.diagnostic_log.push(format!("[EXPORT] {}: {}", event_type, export.message));
            vec![JobNotice::ExportFailed {
                event_type,
                message: export.message,
            }]
        }
        _ => vec![JobNotice::ExportProgress {
            event_type,
            message: export.message,
        }],
    }
}

fn exported_file(export: &ExportEvent, kind: FileKind) -> Option<DownloadableFile> {
    let name = export.file_name.clone().or_else(|| {
        export
            .file_path
            .as_deref()
            .and_then(|path| Path::new(path).file_name())
            .map(|name| name.to_string_lossy().into_owned())
    })?;
    if !is_plain_file_name(&name) {
        return None;
    }
    Some(DownloadableFile {
        path: export.file_path.clone().unwrap_or_else(|| name.clone()),
        name,
        kind,
        semester: export.semester.clone(),
        timestamp: export.timestamp.unwrap_or_else(Utc::now),
    })
}

fn record_log(job: &mut JobState, log: LogEvent) {
    let level = log
        .level
        .as_deref()
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "INFO".to_string());
    job.diagnostic_log.push(format!("[{level}] {}", log.message));
}
