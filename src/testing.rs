//! Scripted compute client for tests
//!
//! `FakeCompute` replays a scripted sequence of refresh snapshots and
//! records every command it receives, so strategy and driver tests can
//! assert on both the observed transitions and the commands issued.

use crate::client::ComputeClient;
use crate::error::Result;
use crate::instance::{Server, ServerStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a server snapshot pinned to a hypervisor host
pub fn server_on_host(name: &str, status: ServerStatus, host: &str) -> Server {
    Server {
        id: format!("uuid-{}", name),
        name: name.to_string(),
        status,
        hypervisor_hostname: Some(host.to_string()),
    }
}

/// Scripted control-plane double
///
/// `refresh` pops the next scripted snapshot; once the script is exhausted
/// the last snapshot repeats, which models an instance stuck in a state.
pub struct FakeCompute {
    listing: Vec<Server>,
    refreshes: Mutex<VecDeque<Server>>,
    last_refresh: Mutex<Option<Server>>,
    refresh_count: Mutex<usize>,
    actions: Mutex<Vec<String>>,
}

impl FakeCompute {
    /// Create a fake whose `list_servers` returns `listing`
    pub fn new(listing: Vec<Server>) -> Self {
        Self {
            listing,
            refreshes: Mutex::new(VecDeque::new()),
            last_refresh: Mutex::new(None),
            refresh_count: Mutex::new(0),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Append a snapshot to the refresh script
    pub fn with_refresh(self, server: Server) -> Self {
        self.refreshes.lock().unwrap().push_back(server);
        self
    }

    /// Commands issued so far, in order
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    /// How many times a command matching `prefix` was issued
    pub fn action_count(&self, prefix: &str) -> usize {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.starts_with(prefix))
            .count()
    }

    /// How many refreshes have been served
    pub fn refresh_count(&self) -> usize {
        *self.refresh_count.lock().unwrap()
    }

    fn record(&self, action: String) {
        self.actions.lock().unwrap().push(action);
    }
}

#[async_trait]
impl ComputeClient for FakeCompute {
    async fn list_servers(&self, _host: &str) -> Result<Vec<Server>> {
        Ok(self.listing.clone())
    }

    async fn refresh(&self, server: &Server) -> Result<Server> {
        *self.refresh_count.lock().unwrap() += 1;

        let next = self.refreshes.lock().unwrap().pop_front();
        match next {
            Some(snapshot) => {
                *self.last_refresh.lock().unwrap() = Some(snapshot.clone());
                Ok(snapshot)
            }
            None => {
                let last = self.last_refresh.lock().unwrap().clone();
                Ok(last.unwrap_or_else(|| server.clone()))
            }
        }
    }

    async fn live_migrate(&self, server: &Server, target: Option<&str>) -> Result<()> {
        self.record(format!(
            "live-migrate {} -> {}",
            server.name,
            target.unwrap_or("<scheduler>")
        ));
        Ok(())
    }

    async fn cold_migrate(&self, server: &Server, target: Option<&str>) -> Result<()> {
        self.record(format!(
            "cold-migrate {} -> {}",
            server.name,
            target.unwrap_or("<scheduler>")
        ));
        Ok(())
    }

    async fn confirm_resize(&self, server: &Server) -> Result<()> {
        self.record(format!("confirm-resize {}", server.name));
        Ok(())
    }

    async fn resume(&self, server: &Server) -> Result<()> {
        self.record(format!("resume {}", server.name));
        Ok(())
    }

    async fn suspend(&self, server: &Server) -> Result<()> {
        self.record(format!("suspend {}", server.name));
        Ok(())
    }
}
