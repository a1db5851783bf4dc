//! Error types for the evacuation tool

use crate::instance::ServerStatus;
use thiserror::Error;

/// Evacuation result type
pub type Result<T> = std::result::Result<T, EvacuationError>;

/// Errors that can occur while evacuating a host
#[derive(Error, Debug)]
pub enum EvacuationError {
    /// Control-plane HTTP error (network failure, non-2xx response, ...)
    #[error("control plane error: {0}")]
    ControlPlane(#[from] reqwest::Error),

    /// Authentication against the identity service failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A poll loop exceeded the timeout budget
    #[error("instance {server} still in state {status} after {timeout_secs}s, aborting")]
    MigrationTimeout {
        /// Instance name
        server: String,
        /// Status the instance was stuck in
        status: ServerStatus,
        /// The configured timeout budget in seconds
        timeout_secs: u64,
    },

    /// Post-migration verification found the instance still on the source host
    #[error("instance {server} did not migrate from {host}, aborting")]
    StillOnSourceHost {
        /// Instance name
        server: String,
        /// The source host being evacuated
        host: String,
    },

    /// An instance settled in a status the strategy did not expect
    #[error("instance {server} is in {status} state while it should be {expected}, aborting")]
    UnexpectedStatus {
        /// Instance name
        server: String,
        /// Observed status
        status: ServerStatus,
        /// The status the strategy required
        expected: ServerStatus,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl EvacuationError {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
