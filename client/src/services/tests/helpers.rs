//! Test helpers for client service tests

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Notify};

use crate::config::ClientConfig;
use crate::core::GenerationPayload;
use crate::error::{ClientResult, RefreshFailure};
use crate::orchestrator::JobOrchestrator;
use crate::traits::{
    ChannelConnection, EventChannel, MockScheduleApi, Navigator, ScheduleApi, TokenRefresher,
};
use crate::types::{GenerateAck, JobNotice, LoginReason};
use shared::{ClientEvent, ServerEvent};

/// Orchestrator over a mocked API with default configuration
pub fn create_test_orchestrator(api: MockScheduleApi) -> Arc<JobOrchestrator> {
    let api: Arc<dyn ScheduleApi> = Arc::new(api);
    Arc::new(JobOrchestrator::new(api, &ClientConfig::default()))
}

/// Navigator that records every redirect
#[derive(Default)]
pub struct RecordingNavigator {
    pub redirects: Mutex<Vec<LoginReason>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<LoginReason> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self, reason: LoginReason) {
        self.redirects.lock().unwrap().push(reason);
    }
}

/// Refresher that blocks until released, so tests can pile up waiters
pub struct GatedRefresher {
    pub gate: Arc<Notify>,
    pub outcome: Result<(), RefreshFailure>,
    pub calls: Mutex<u32>,
}

impl GatedRefresher {
    pub fn new(outcome: Result<(), RefreshFailure>) -> Self {
        Self {
            gate: Arc::new(Notify::new()),
            outcome,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl TokenRefresher for GatedRefresher {
    async fn refresh_token(&self) -> Result<(), RefreshFailure> {
        *self.calls.lock().unwrap() += 1;
        self.gate.notified().await;
        self.outcome.clone()
    }
}

/// API whose generate call blocks until released, so tests can act while a
/// submission is outstanding
pub struct GatedApi {
    pub gate: Arc<Notify>,
    pub ack: GenerateAck,
    pub stop_calls: Mutex<u32>,
}

impl GatedApi {
    pub fn new(ack: GenerateAck) -> Self {
        Self {
            gate: Arc::new(Notify::new()),
            ack,
            stop_calls: Mutex::new(0),
        }
    }

    pub fn stop_calls(&self) -> u32 {
        *self.stop_calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl ScheduleApi for GatedApi {
    async fn generate(&self, _payload: &GenerationPayload) -> ClientResult<GenerateAck> {
        self.gate.notified().await;
        Ok(self.ack.clone())
    }

    async fn stop_generation(&self) -> ClientResult<()> {
        *self.stop_calls.lock().unwrap() += 1;
        Ok(())
    }

    async fn download(&self, _file_name: &str) -> ClientResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn process_results(&self) -> ClientResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }
}

/// Event channel backed by in-memory queues; each `connect` hands out the
/// next prepared connection
pub struct ScriptedChannel {
    connections: Mutex<Vec<ChannelConnection>>,
}

/// Test side of one scripted connection
pub struct ScriptedPeer {
    pub to_client: mpsc::Sender<ServerEvent>,
    pub from_client: mpsc::Receiver<ClientEvent>,
}

impl ScriptedChannel {
    pub fn with_connections(count: usize) -> (Arc<Self>, Vec<ScriptedPeer>) {
        let mut connections = Vec::new();
        let mut peers = Vec::new();
        for _ in 0..count {
            let (out_tx, out_rx) = mpsc::channel(16);
            let (in_tx, in_rx) = mpsc::channel(16);
            connections.push(ChannelConnection { outbound: out_tx, inbound: in_rx });
            peers.push(ScriptedPeer { to_client: in_tx, from_client: out_rx });
        }
        connections.reverse();
        (Arc::new(Self { connections: Mutex::new(connections) }), peers)
    }
}

#[async_trait::async_trait]
impl EventChannel for ScriptedChannel {
    async fn connect(&self) -> crate::error::ClientResult<ChannelConnection> {
        self.connections
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| crate::error::ClientError::channel("no more scripted connections"))
    }
}

/// Drain every notice currently queued on a receiver
pub fn drain_notices(rx: &mut tokio::sync::broadcast::Receiver<JobNotice>) -> Vec<JobNotice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

/// Test helper to wait for async operations
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return true;
        }

        if start.elapsed() > timeout {
            return false;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
