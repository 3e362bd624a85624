//! Client session
//!
//! Wires the services together with dependency injection: one cookie jar,
//! one HTTP client with its refresh coordinator, one job orchestrator and
//! one event multiplexer per session.

use std::sync::Arc;

use reqwest::cookie::Jar;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use shared::{component_info, ComponentId, Stage};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::orchestrator::JobOrchestrator;
use crate::services::{
    build_http_client, EventMultiplexer, HttpTokenRefresher, LoginRedirector, RealApiClient,
    RefreshCoordinator, Subscription, WsEventChannel,
};
use crate::traits::{EventChannel, Navigator, ScheduleApi, TokenRefresher};
use crate::types::JobNotice;

pub struct ScheduleSession {
    id: Uuid,
    api: Arc<dyn ScheduleApi>,
    orchestrator: Arc<JobOrchestrator>,
    multiplexer: EventMultiplexer,
    navigator: Arc<LoginRedirector>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ScheduleSession {
    /// Build a session talking to the configured server
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let jar = Arc::new(Jar::default());
        let http = build_http_client(config, jar.clone())?;
        let navigator = Arc::new(LoginRedirector::new(config.login_url.clone()));

        let refresher: Arc<dyn TokenRefresher> = Arc::new(HttpTokenRefresher::new(http.clone(), &config.api_url)?);
        let coordinator = Arc::new(RefreshCoordinator::new(refresher, navigator.clone()));
        let api: Arc<dyn ScheduleApi> = Arc::new(RealApiClient::new(
            http,
            config,
            coordinator.clone(),
            navigator.clone() as Arc<dyn Navigator>,
        ));
        let channel: Arc<dyn EventChannel> = Arc::new(WsEventChannel::new(
            config.events_url.clone(),
            config.api_url.clone(),
            jar,
        ));

        Ok(Self::with_services(config, api, channel, navigator, coordinator))
    }

    /// Build a session over injected services
    pub fn with_services(
        config: &ClientConfig,
        api: Arc<dyn ScheduleApi>,
        channel: Arc<dyn EventChannel>,
        navigator: Arc<LoginRedirector>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        let id = Uuid::new_v4();
        let orchestrator = Arc::new(JobOrchestrator::new(api.clone(), config));
        let multiplexer = EventMultiplexer::new(orchestrator.clone(), channel, config.reconnect_interval);
        component_info!(ComponentId::Cli, "🆔 Session {} created for {}", id, config.api_url);

        Self {
            id,
            api,
            orchestrator,
            multiplexer,
            navigator,
            coordinator,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Direct access to the REST surface, bypassing job admission
    pub fn api(&self) -> &Arc<dyn ScheduleApi> {
        &self.api
    }

    pub fn orchestrator(&self) -> &Arc<JobOrchestrator> {
        &self.orchestrator
    }

    pub fn navigator(&self) -> &Arc<LoginRedirector> {
        &self.navigator
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Start receiving server events; dispatch stops when the handle drops
    pub fn attach(&self) -> Subscription {
        self.multiplexer.attach()
    }

    /// Wait for the running job to reach a terminal stage
    ///
    /// `COMPLETED` and `ABORTED` are successes; `ERROR` becomes `JobFailed`.
    pub async fn wait_until_finished(&self) -> ClientResult<Stage> {
        let mut notices = self.orchestrator.subscribe();
        loop {
            // Checked after subscribing so a terminal stage cannot slip through
            let snapshot = self.orchestrator.snapshot().await;
            if snapshot.stage.is_terminal() {
                return finished(snapshot.stage, snapshot.last_error);
            }

            match notices.recv().await {
                Ok(JobNotice::Completed { .. }) => return Ok(Stage::Completed),
                Ok(JobNotice::Aborted { .. }) => return Ok(Stage::Aborted),
                Ok(JobNotice::Failed { message }) => return Err(ClientError::JobFailed { message }),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => {
                    return Err(ClientError::channel("job notices closed before the job finished"));
                }
            }
        }
    }
}

fn finished(stage: Stage, last_error: Option<String>) -> ClientResult<Stage> {
    match stage {
        Stage::Error => Err(ClientError::JobFailed {
            message: last_error.unwrap_or_else(|| "unknown error".to_string()),
        }),
        stage => Ok(stage),
    }
}
