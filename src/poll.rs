//! Bounded wait-for-status-transition loop
//!
//! Every strategy waits for the control plane the same way: an initial grace
//! period so the async command registers, then short sleep/refresh ticks
//! until the "still in progress" predicate clears or the timeout budget is
//! spent. The budget is checked against an accumulated seconds counter that
//! starts at the grace period, so a run over budget fails on the first tick
//! past it.

use crate::client::ComputeClient;
use crate::error::{EvacuationError, Result};
use crate::instance::{Server, ServerStatus};
use std::time::Duration;
use tracing::debug;

/// Grace period before the first refresh, letting the control plane register
/// the state change
pub const INITIAL_GRACE: Duration = Duration::from_secs(5);

/// Interval between subsequent refreshes
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Waits for a status transition with a bounded timeout
///
/// The same timeout value bounds every wait loop in a run; a multi-phase
/// strategy may legally take a multiple of it in wall clock.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    timeout_secs: u64,
}

impl Poller {
    /// Create a poller with the given timeout budget in seconds
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// The configured timeout budget in seconds
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Sleep, refresh, and re-check until `still_pending` clears
    ///
    /// Returns the final refreshed snapshot once the predicate is false. If
    /// the accumulated elapsed time exceeds the budget while the predicate
    /// still holds, fails with [`EvacuationError::MigrationTimeout`] naming
    /// the instance and its last-seen status.
    pub async fn wait_while<C>(
        &self,
        client: &C,
        server: Server,
        still_pending: impl Fn(&ServerStatus) -> bool,
    ) -> Result<Server>
    where
        C: ComputeClient + ?Sized,
    {
        tokio::time::sleep(INITIAL_GRACE).await;
        let mut elapsed_secs = INITIAL_GRACE.as_secs();
        let mut server = client.refresh(&server).await?;

        while still_pending(&server.status) {
            if elapsed_secs > self.timeout_secs {
                return Err(EvacuationError::MigrationTimeout {
                    server: server.name,
                    status: server.status,
                    timeout_secs: self.timeout_secs,
                });
            }

            debug!(
                server = %server.name,
                status = %server.status,
                elapsed_secs,
                "Still waiting for transition"
            );

            tokio::time::sleep(POLL_INTERVAL).await;
            elapsed_secs += POLL_INTERVAL.as_secs();
            server = client.refresh(&server).await?;
        }

        Ok(server)
    }
}
