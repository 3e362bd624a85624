//! Service implementations
//!
//! Real implementations of the service traits plus the two coordinators
//! that sit between them and the job.

pub mod api_client;
pub mod event_channel;
pub mod multiplexer;
pub mod navigator;
pub mod refresh_coordinator;

// Re-export service implementations
pub use api_client::{build_http_client, HttpTokenRefresher, RealApiClient};
pub use event_channel::WsEventChannel;
pub use multiplexer::{EventMultiplexer, Subscription};
pub use navigator::LoginRedirector;
pub use refresh_coordinator::RefreshCoordinator;

#[cfg(test)]
mod tests;
