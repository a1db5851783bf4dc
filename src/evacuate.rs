//! Host evacuation driver
//!
//! Lists every instance on the source host and pushes each one through the
//! classifier + strategy pipeline, strictly one at a time and in listing
//! order. The first fatal error aborts the run; remaining instances are not
//! attempted.

use crate::client::ComputeClient;
use crate::error::Result;
use crate::migrate::MigrationRunner;
use tracing::{debug, info};

/// Default timeout budget per wait loop (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for one evacuation run
#[derive(Debug, Clone)]
pub struct EvacuationConfig {
    /// Host being evacuated
    pub source_host: String,

    /// Destination hint; the scheduler chooses when absent
    pub target_host: Option<String>,

    /// Timeout budget in seconds, applied to every wait loop independently
    pub timeout_secs: u64,
}

impl EvacuationConfig {
    /// Create a config with the default timeout and no destination hint
    pub fn new(source_host: impl Into<String>) -> Self {
        Self {
            source_host: source_host.into(),
            target_host: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the destination host hint
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_host = Some(target.into());
        self
    }

    /// Set the timeout budget
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Drives the evacuation of a single host
pub struct Evacuator<'a, C: ComputeClient + ?Sized> {
    client: &'a C,
    config: EvacuationConfig,
}

impl<'a, C: ComputeClient + ?Sized> Evacuator<'a, C> {
    /// Create a driver over an authenticated compute client
    pub fn new(client: &'a C, config: EvacuationConfig) -> Self {
        Self { client, config }
    }

    /// Evacuate the host, returning how many instances were migrated
    ///
    /// A host with zero instances is a successful no-op. Unsupported
    /// statuses are skipped; any fatal error inside a strategy stops the
    /// run immediately.
    pub async fn run(&self) -> Result<usize> {
        let servers = self.client.list_servers(&self.config.source_host).await?;

        if servers.is_empty() {
            info!(
                "Host {} has {} instances.",
                self.config.source_host,
                servers.len()
            );
            return Ok(0);
        }

        info!(
            "Host {} has {} instances. Migrating...",
            self.config.source_host,
            servers.len()
        );
        for server in &servers {
            debug!("{}: {}", server.name, server.status);
        }

        let runner = MigrationRunner::new(self.client, &self.config);
        let mut migrated = 0;
        for server in servers {
            if runner.migrate(server).await? {
                migrated += 1;
            }
        }

        Ok(migrated)
    }
}
