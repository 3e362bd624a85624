//! Single-flight credential refresh
//!
//! Concurrent requests that hit 401 share one refresh call. The first caller
//! becomes the leader and issues the call; everyone arriving while it is in
//! flight parks on a oneshot and receives the leader's outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use shared::{component_debug, component_info, component_warn, ComponentId};
use crate::error::RefreshFailure;
use crate::traits::{Navigator, TokenRefresher};
use crate::types::LoginReason;

type Waiter = oneshot::Sender<Result<(), RefreshFailure>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<Result<(), RefreshFailure>>),
}

pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<RefreshState>,
    refresh_count: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(refresher: Arc<dyn TokenRefresher>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            refresher,
            navigator,
            state: Mutex::new(RefreshState::default()),
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Refresh credentials, joining an in-flight refresh when there is one
    pub async fn refresh(&self) -> Result<(), RefreshFailure> {
        // Check-and-set under the lock; the guard is dropped before any await
        let role = {
            let mut state = self.lock_state();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Role::Waiter(rx)
            } else {
                state.in_flight = true;
                Role::Leader
            }
        };

        match role {
            Role::Waiter(rx) => {
                component_debug!(ComponentId::Auth, "⏳ Waiting for in-flight credential refresh");
                rx.await.unwrap_or(Err(RefreshFailure::Cancelled))
            }
            Role::Leader => self.lead().await,
        }
    }

    async fn lead(&self) -> Result<(), RefreshFailure> {
        let mut guard = InFlightGuard { state: &self.state, released: false };
        let attempt = self.refresh_count.fetch_add(1, Ordering::SeqCst) + 1;
        component_info!(ComponentId::Auth, "🔑 Refreshing credentials (attempt {})", attempt);

        let outcome = self.refresher.refresh_token().await;
        let released = guard.release(outcome.clone());

        match &outcome {
            Ok(()) => {
                component_info!(ComponentId::Auth, "✅ Credentials refreshed, replaying {} waiting request(s)", released);
            }
            Err(failure) => {
                component_warn!(ComponentId::Auth, "❌ Credential refresh failed: {}", failure);
                self.navigator.redirect_to_login(LoginReason::SessionExpired);
            }
        }
        outcome
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock_state().in_flight
    }

    pub fn waiter_count(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Refresh calls issued so far
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets the in-flight flag and releases waiters, even when the leader's
/// future is dropped mid-refresh
struct InFlightGuard<'a> {
    state: &'a Mutex<RefreshState>,
    released: bool,
}

impl InFlightGuard<'_> {
    fn release(&mut self, outcome: Result<(), RefreshFailure>) -> usize {
        self.released = true;
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        let count = waiters.len();
        for waiter in waiters {
            // A waiter whose request was dropped has nobody to notify
            let _ = waiter.send(outcome.clone());
        }
        count
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.release(Err(RefreshFailure::Cancelled));
        }
    }
}
