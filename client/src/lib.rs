//! Client-side coordination core for the academic scheduling platform
//!
//! Submits timetable generation jobs to the scheduling server, tracks the
//! optimizer's progress over the event channel and keeps the session
//! authenticated by refreshing credentials transparently.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod state;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::{ClientConfig, PipelineConfig};
pub use error::{ClientError, ClientResult, RefreshFailure, ValidationError};
pub use orchestrator::JobOrchestrator;
pub use session::ScheduleSession;
pub use types::*;

// Re-export trait definitions
pub use traits::{ChannelConnection, EventChannel, Navigator, ScheduleApi, TokenRefresher};

// Re-export service implementations
pub use services::{
    EventMultiplexer, HttpTokenRefresher, LoginRedirector, RealApiClient, RefreshCoordinator,
    Subscription, WsEventChannel,
};
