//! HTTP facade for the schedule backend
//!
//! Every request goes through `execute`, which owns the authentication
//! policy: 403 redirects to the login page, 401 triggers one shared
//! credential refresh and a single replay of the original request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Request, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use shared::{component_debug, component_info, component_warn, ComponentId};
use crate::config::ClientConfig;
use crate::core::GenerationPayload;
use crate::error::{ClientError, ClientResult, RefreshFailure};
use crate::services::RefreshCoordinator;
use crate::traits::{Navigator, ScheduleApi, TokenRefresher};
use crate::types::{GenerateAck, LoginReason};

const REFRESH_PATH: &str = "auth/refresh-token";
const GENERATE_PATH: &str = "api/schedule/generate";
const STOP_PATH: &str = "api/schedule/stop-ga";
const DOWNLOAD_PATH: &str = "api/schedule/download/";
const PROCESS_RESULTS_PATH: &str = "api/schedule/process-results";

/// Build the credentialed HTTP client; the jar is shared with the event channel
pub fn build_http_client(config: &ClientConfig, jar: Arc<Jar>) -> ClientResult<Client> {
    Client::builder()
        .cookie_provider(jar)
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| ClientError::config(format!("Failed to create HTTP client: {e}")))
}

/// Calls `POST /auth/refresh-token` directly, outside the 401 interception
pub struct HttpTokenRefresher {
    http: Client,
    url: Url,
}

impl HttpTokenRefresher {
    pub fn new(http: Client, api_url: &Url) -> ClientResult<Self> {
        Ok(Self {
            http,
            url: api_url.join(REFRESH_PATH)?,
        })
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh_token(&self) -> Result<(), RefreshFailure> {
        let response = self
            .http
            .post(self.url.clone())
            .send()
            .await
            .map_err(|e| RefreshFailure::Transport { message: e.to_string() })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RefreshFailure::Rejected { status: response.status().as_u16() })
        }
    }
}

/// Body of the generate endpoint; every field is optional on the wire
#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    aborted: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct RealApiClient {
    http: Client,
    api_url: Url,
    generate_timeout: Duration,
    coordinator: Arc<RefreshCoordinator>,
    navigator: Arc<dyn Navigator>,
}

impl RealApiClient {
    pub fn new(
        http: Client,
        config: &ClientConfig,
        coordinator: Arc<RefreshCoordinator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            api_url: config.api_url.clone(),
            generate_timeout: config.generate_timeout,
            coordinator,
            navigator,
        }
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Send a request under the authentication policy
    pub async fn execute(&self, request: Request) -> ClientResult<Response> {
        let endpoint = request.url().path().to_string();
        // Streaming bodies cannot be replayed
        let replay = request.try_clone();

        let response = self.http.execute(request).await?;
        match response.status() {
            StatusCode::FORBIDDEN => Err(self.deny(&endpoint)),
            StatusCode::UNAUTHORIZED => {
                let Some(replay) = replay else {
                    component_warn!(ComponentId::Auth, "🚫 {} unauthorized and not replayable", endpoint);
                    return Err(ClientError::Unauthorized);
                };

                component_debug!(ComponentId::Auth, "🔄 {} answered 401, refreshing credentials", endpoint);
                self.coordinator.refresh().await?;

                let response = self.http.execute(replay).await?;
                match response.status() {
                    StatusCode::FORBIDDEN => Err(self.deny(&endpoint)),
                    StatusCode::UNAUTHORIZED => {
                        component_warn!(ComponentId::Auth, "🚫 {} still unauthorized after refresh", endpoint);
                        Err(ClientError::Unauthorized)
                    }
                    _ => Ok(response),
                }
            }
            _ => Ok(response),
        }
    }

    fn deny(&self, endpoint: &str) -> ClientError {
        component_warn!(ComponentId::Auth, "⛔ Access denied for {}", endpoint);
        self.navigator.redirect_to_login(LoginReason::AccessDenied);
        ClientError::AccessDenied
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.api_url.join(path)?)
    }
}

fn ensure_success(response: &Response) -> ClientResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::HttpStatus {
            status: status.as_u16(),
            endpoint: response.url().path().to_string(),
        })
    }
}

/// The generate response acknowledges or refuses the job; stage changes
/// still come from the event channel
fn parse_generate_response(status: StatusCode, endpoint: &str, body: &str) -> ClientResult<GenerateAck> {
    let parsed: GenerateResponse = serde_json::from_str(body).unwrap_or_default();

    if parsed.aborted {
        return Ok(GenerateAck::Aborted);
    }
    if let Some(error) = parsed.error {
        return Ok(GenerateAck::Rejected {
            error,
            message: parsed.message.unwrap_or_default(),
        });
    }
    if status.is_success() {
        Ok(GenerateAck::Accepted)
    } else {
        Err(ClientError::HttpStatus {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl ScheduleApi for RealApiClient {
    async fn generate(&self, payload: &GenerationPayload) -> ClientResult<GenerateAck> {
        let url = self.endpoint(GENERATE_PATH)?;
        component_info!(
            ComponentId::Job,
            "🚀 Submitting generation job ({} classes, {} subjects)",
            payload.classes().len(),
            payload.subjects().len()
        );

        let request = self
            .http
            .post(url)
            .json(payload)
            .timeout(self.generate_timeout)
            .build()?;
        let response = self.execute(request).await?;
        let status = response.status();
        let endpoint = response.url().path().to_string();
        let body = response.text().await?;

        parse_generate_response(status, &endpoint, &body)
    }

    async fn stop_generation(&self) -> ClientResult<()> {
        let request = self.http.post(self.endpoint(STOP_PATH)?).build()?;
        let response = self.execute(request).await?;
        ensure_success(&response)?;
        component_info!(ComponentId::Job, "🛑 Stop request accepted");
        Ok(())
    }

    async fn download(&self, file_name: &str) -> ClientResult<Vec<u8>> {
        let mut url = self.endpoint(DOWNLOAD_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::config(format!("API URL cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .push(file_name);

        let request = self.http.get(url).build()?;
        let response = self.execute(request).await?;
        ensure_success(&response)?;
        let bytes = response.bytes().await?;
        component_info!(ComponentId::Job, "📥 Downloaded {} ({} bytes)", file_name, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn process_results(&self) -> ClientResult<serde_json::Value> {
        let request = self.http.post(self.endpoint(PROCESS_RESULTS_PATH)?).build()?;
        let response = self.execute(request).await?;
        ensure_success(&response)?;
        Ok(response.json().await?)
    }
}
