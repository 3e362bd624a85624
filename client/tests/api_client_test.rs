//! Schedule API integration tests against a mock HTTP server

mod fixtures;
mod helpers;

use std::time::Duration;

use assert_matches::assert_matches;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use client::core::PayloadPipeline;
use client::{ClientError, GenerateAck, ScheduleApi, ScheduleData, SelectionSet};
use fixtures::*;
use helpers::*;

const GENERATE: &str = "/api/schedule/generate";

fn test_payload() -> client::core::GenerationPayload {
    let data: ScheduleData = serde_json::from_value(schedule_data_json()).unwrap();
    PayloadPipeline::default().build(&data, &SelectionSet::default()).unwrap()
}

#[tokio::test]
async fn test_generate_posts_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE))
        .and(body_partial_json(serde_json::json!({
            "rooms": [
                { "room_id": "A101", "type": "theory", "capacity": 80 },
                { "room_id": "B201", "type": "practice", "capacity": 40 }
            ],
            "days_of_week": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "started" })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _, _) = create_api_client(&create_test_config(&server.uri()));

    assert_eq!(api.generate(&test_payload()).await.unwrap(), GenerateAck::Accepted);
}

#[tokio::test]
async fn test_generate_aborted_and_rejected_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "aborted": true })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": "GA_ALREADY_RUNNING",
            "message": "Another generation is running"
        })))
        .mount(&server)
        .await;

    let (api, _, _) = create_api_client(&create_test_config(&server.uri()));
    let payload = test_payload();

    assert_eq!(api.generate(&payload).await.unwrap(), GenerateAck::Aborted);
    assert_matches!(
        api.generate(&payload).await,
        Ok(GenerateAck::Rejected { ref error, .. }) if error == "GA_ALREADY_RUNNING"
    );
}

#[tokio::test]
async fn test_generate_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.generate_timeout = Duration::from_millis(200);
    let (api, _, _) = create_api_client(&config);

    assert_matches!(api.generate(&test_payload()).await, Err(ClientError::Timeout { .. }));
}

#[tokio::test]
async fn test_download_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/schedule/download/HK1.xlsx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04xlsx".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let (api, _, _) = create_api_client(&create_test_config(&server.uri()));

    assert_eq!(api.download("HK1.xlsx").await.unwrap(), b"PK\x03\x04xlsx".to_vec());
    assert_matches!(
        api.download("missing.xlsx").await,
        Err(ClientError::HttpStatus { status: 404, .. })
    );
}

#[tokio::test]
async fn test_base_path_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/backend/api/schedule/stop-ga"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/backend", server.uri()));
    let (api, _, _) = create_api_client(&config);

    api.stop_generation().await.unwrap();
}
