//! Service tests for the schedule client
//!
//! Exercises the coordinators against mocked traits; HTTP and WebSocket
//! transports are covered by the crate's integration tests.

pub mod helpers;
pub mod session;
