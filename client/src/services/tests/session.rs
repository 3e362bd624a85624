//! Tests for waiting on a session's job

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::fixtures::*;
use super::helpers::*;
use crate::config::ClientConfig;
use crate::services::{LoginRedirector, RefreshCoordinator};
use crate::session::ScheduleSession;
use crate::traits::{MockScheduleApi, ScheduleApi};
use crate::types::{GenerateAck, StartOutcome};
use shared::Stage;

#[tokio::test]
async fn test_wait_ignores_outcome_of_previous_run() {
    let config = ClientConfig::default();
    let mut api = MockScheduleApi::new();
    api.expect_generate().times(1).returning(|_| Ok(GenerateAck::Accepted));
    let api: Arc<dyn ScheduleApi> = Arc::new(api);

    let (channel, mut peers) = ScriptedChannel::with_connections(1);
    let peer = peers.remove(0);
    let navigator = Arc::new(LoginRedirector::new(config.login_url.clone()));
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(GatedRefresher::new(Ok(()))),
        navigator.clone(),
    ));
    let session = ScheduleSession::with_services(&config, api, channel, navigator, coordinator);
    let _subscription = session.attach();

    peer.to_client.send(status_event("START", None)).await.unwrap();
    peer.to_client.send(status_event("COMPLETED", None)).await.unwrap();
    assert!(wait_for_condition(|| {
        let orchestrator = session.orchestrator().clone();
        async move { orchestrator.snapshot().await.stage == Stage::Completed }
    }, 500)
    .await);

    let outcome = session
        .orchestrator()
        .start(&create_test_payload())
        .await
        .unwrap();
    assert_eq!(outcome, StartOutcome::Accepted);

    // Nothing has happened for the new run yet
    assert!(timeout(Duration::from_millis(100), session.wait_until_finished()).await.is_err());

    peer.to_client.send(status_event("START", None)).await.unwrap();
    peer.to_client.send(status_event("RUNNING_GA", Some(40.0))).await.unwrap();
    peer.to_client.send(status_event("COMPLETED", None)).await.unwrap();

    let stage = timeout(Duration::from_secs(1), session.wait_until_finished())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stage, Stage::Completed);
}
