//! Migration strategies
//!
//! One strategy per starting status:
//!
//! 1. **Live** (ACTIVE, PAUSED): live-migrate, wait out MIGRATING.
//! 2. **Cold** (SHUTOFF): cold-migrate through the resize flow, confirm the
//!    resize once the control plane asks for it.
//! 3. **Suspended** (SUSPENDED): resume, live-migrate, re-suspend.
//!
//! Every strategy ends by verifying the instance actually left the source
//! host; an instance still reported there after a "successful" migration is
//! a fatal inconsistency.

use crate::client::ComputeClient;
use crate::error::{EvacuationError, Result};
use crate::evacuate::EvacuationConfig;
use crate::instance::{classify, MigrationKind, Server, ServerStatus};
use crate::poll::Poller;
use tracing::{info, warn};

/// Runs the strategy matching a server's observed status
pub struct MigrationRunner<'a, C: ComputeClient + ?Sized> {
    client: &'a C,
    config: &'a EvacuationConfig,
    poller: Poller,
}

impl<'a, C: ComputeClient + ?Sized> MigrationRunner<'a, C> {
    /// Create a runner for one evacuation run
    pub fn new(client: &'a C, config: &'a EvacuationConfig) -> Self {
        Self {
            client,
            config,
            poller: Poller::new(config.timeout_secs),
        }
    }

    /// Classify the server and run the matching strategy
    ///
    /// Returns whether the server was migrated. Unsupported statuses are
    /// skipped with a warning; every other failure is fatal and propagates
    /// to the driver.
    pub async fn migrate(&self, server: Server) -> Result<bool> {
        match classify(&server.status) {
            MigrationKind::Live => {
                self.migrate_live(server).await?;
            }
            MigrationKind::Cold => {
                self.migrate_cold(server).await?;
            }
            MigrationKind::Suspended => {
                self.migrate_suspended(server).await?;
            }
            MigrationKind::Unsupported => {
                warn!(
                    "instance {} state {} is not supported, skipping",
                    server.name, server.status
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Live migration: issue the command, wait out MIGRATING, verify the host
    async fn migrate_live(&self, server: Server) -> Result<Server> {
        self.client
            .live_migrate(&server, self.config.target_host.as_deref())
            .await?;

        let server = self
            .poller
            .wait_while(self.client, server, |s| *s == ServerStatus::Migrating)
            .await?;

        self.verify_left_source(&server)?;
        self.log_migrated(&server);
        Ok(server)
    }

    /// Cold migration: migrate, then confirm the resize once it shows up
    async fn migrate_cold(&self, server: Server) -> Result<Server> {
        self.client
            .cold_migrate(&server, self.config.target_host.as_deref())
            .await?;

        // SHUTOFF means the migration has not started transitioning yet
        let mut server = self
            .poller
            .wait_while(self.client, server, |s| *s == ServerStatus::Shutoff)
            .await?;

        if server.status == ServerStatus::VerifyResize {
            self.client.confirm_resize(&server).await?;
            server = self
                .poller
                .wait_while(self.client, server, |s| *s == ServerStatus::VerifyResize)
                .await?;
        }

        self.verify_left_source(&server)?;
        self.log_migrated(&server);
        Ok(server)
    }

    /// Suspended migration: resume, live-migrate, re-suspend
    ///
    /// Each of the three waits gets the full timeout budget; the elapsed
    /// counter does not carry over between phases.
    async fn migrate_suspended(&self, server: Server) -> Result<Server> {
        info!(
            "instance {} is in {} state, resuming",
            server.name, server.status
        );

        self.client.resume(&server).await?;
        let server = self
            .poller
            .wait_while(self.client, server, |s| *s == ServerStatus::Suspended)
            .await?;

        if server.status != ServerStatus::Active {
            return Err(EvacuationError::UnexpectedStatus {
                server: server.name,
                status: server.status,
                expected: ServerStatus::Active,
            });
        }

        let server = self.migrate_live(server).await?;

        self.client.suspend(&server).await?;
        let server = self
            .poller
            .wait_while(self.client, server, |s| *s != ServerStatus::Suspended)
            .await?;

        info!("{} is {}", server.name, server.status);
        Ok(server)
    }

    /// Fatal if the instance is still reported on the host being evacuated
    fn verify_left_source(&self, server: &Server) -> Result<()> {
        if server.is_on_host(&self.config.source_host) {
            return Err(EvacuationError::StillOnSourceHost {
                server: server.name.clone(),
                host: self.config.source_host.clone(),
            });
        }
        Ok(())
    }

    fn log_migrated(&self, server: &Server) {
        info!(
            "instance {} migrated to {}, state {}",
            server.name,
            server.hypervisor_hostname.as_deref().unwrap_or("unknown"),
            server.status
        );
    }
}
