//! Service trait definitions for dependency injection
//!
//! All I/O operations are abstracted through these traits for testability

use async_trait::async_trait;
use tokio::sync::mpsc;

use shared::{ClientEvent, ServerEvent};
use crate::core::GenerationPayload;
use crate::error::{ClientResult, RefreshFailure};
use crate::types::{GenerateAck, LoginReason};

/// Schedule backend REST surface
#[mockall::automock]
#[async_trait]
pub trait ScheduleApi: Send + Sync {
    /// Submit a generation job
    async fn generate(&self, payload: &GenerationPayload) -> ClientResult<GenerateAck>;

    /// Ask the server to stop the running job
    async fn stop_generation(&self) -> ClientResult<()>;

    /// Fetch a result file by name
    async fn download(&self, file_name: &str) -> ClientResult<Vec<u8>>;

    /// Ask the server to post-process the last results
    async fn process_results(&self) -> ClientResult<serde_json::Value>;
}

/// Calls the credential refresh endpoint
#[mockall::automock]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_token(&self) -> Result<(), RefreshFailure>;
}

/// Sends the user to the login page
#[mockall::automock]
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self, reason: LoginReason);
}

/// One live connection of the event channel
#[derive(Debug)]
pub struct ChannelConnection {
    pub outbound: mpsc::Sender<ClientEvent>,
    pub inbound: mpsc::Receiver<ServerEvent>,
}

/// Opens connections to the server event channel
#[mockall::automock]
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Connect; the inbound receiver ends when the connection drops
    async fn connect(&self) -> ClientResult<ChannelConnection>;
}
