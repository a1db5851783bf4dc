//! # novadrain
//!
//! Evacuates all VM instances from one hypervisor host by driving an
//! OpenStack-compatible compute API.
//!
//! ## Architecture
//!
//! ```text
//! Evacuator (driver)
//! ├── list instances on host    ──→  ComputeClient (Nova HTTP)
//! ├── classify each by status        │
//! └── MigrationRunner                │
//!     ├── live / cold / suspended    │
//!     └── Poller (sleep + refresh) ──┘
//! ```
//!
//! The driver walks instances strictly one at a time: classify by status,
//! run the matching strategy, poll each expected status transition with a
//! bounded timeout. Unsupported statuses are skipped with a warning; any
//! other failure aborts the whole run.
//!
//! Per-instance state machine:
//!
//! ```text
//! ACTIVE | PAUSED  →  live-migrate, wait out MIGRATING
//! SHUTOFF          →  cold-migrate, confirm resize at VERIFY_RESIZE
//! SUSPENDED        →  resume → ACTIVE → live-migrate → re-suspend
//! anything else    →  skip with a warning
//! ```
//!
//! See [`migrate`] and [`poll`] for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod evacuate;
pub mod instance;
pub mod migrate;
pub mod poll;

#[cfg(test)]
pub(crate) mod testing;

// Error handling
pub use error::{EvacuationError, Result};

// Data model and classification
pub use instance::{classify, MigrationKind, Server, ServerStatus};

// Control-plane client
pub use client::{CloudCredentials, ComputeClient, NovaClient};

// Polling primitive
pub use poll::{Poller, INITIAL_GRACE, POLL_INTERVAL};

// Strategies and driver
pub use evacuate::{EvacuationConfig, Evacuator, DEFAULT_TIMEOUT_SECS};
pub use migrate::MigrationRunner;
