//! Server wire model and status classification
//!
//! Maps the compute API's server representation into typed form. The
//! hypervisor hostname comes from the `OS-EXT-SRV-ATTR` vendor extension and
//! is only populated on admin-scoped requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a server as reported by the compute API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerStatus {
    /// Server is running
    Active,
    /// Server is paused (memory retained on the hypervisor)
    Paused,
    /// Server is powered off
    Shutoff,
    /// Server is suspended to disk
    Suspended,
    /// A live migration is in flight
    Migrating,
    /// A cold migration/resize is waiting for confirmation
    VerifyResize,
    /// Any status this tool does not handle (ERROR, BUILD, RESCUE, ...)
    Other(String),
}

impl From<String> for ServerStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ACTIVE" => Self::Active,
            "PAUSED" => Self::Paused,
            "SHUTOFF" => Self::Shutoff,
            "SUSPENDED" => Self::Suspended,
            "MIGRATING" => Self::Migrating,
            "VERIFY_RESIZE" => Self::VerifyResize,
            _ => Self::Other(s),
        }
    }
}

impl From<ServerStatus> for String {
    fn from(status: ServerStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Shutoff => write!(f, "SHUTOFF"),
            Self::Suspended => write!(f, "SUSPENDED"),
            Self::Migrating => write!(f, "MIGRATING"),
            Self::VerifyResize => write!(f, "VERIFY_RESIZE"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One compute instance, as fetched from the control plane
///
/// The tool never mutates a `Server` in place; it replaces its copy with a
/// freshly fetched snapshot after every command and every poll tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// Server UUID
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Current status
    pub status: ServerStatus,

    /// Hypervisor currently hosting the server (admin-only extension attribute)
    #[serde(rename = "OS-EXT-SRV-ATTR:hypervisor_hostname")]
    pub hypervisor_hostname: Option<String>,
}

impl Server {
    /// Check whether the server is currently hosted on `host`
    pub fn is_on_host(&self, host: &str) -> bool {
        self.hypervisor_hostname.as_deref() == Some(host)
    }
}

/// Which migration strategy applies to a server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    /// Live-migrate in place (ACTIVE, PAUSED)
    Live,
    /// Cold-migrate through the resize flow (SHUTOFF)
    Cold,
    /// Resume, live-migrate, re-suspend (SUSPENDED)
    Suspended,
    /// Status this tool cannot migrate; skip with a warning
    Unsupported,
}

/// Classify a server status into the strategy that migrates it
pub fn classify(status: &ServerStatus) -> MigrationKind {
    match status {
        ServerStatus::Active | ServerStatus::Paused => MigrationKind::Live,
        ServerStatus::Shutoff => MigrationKind::Cold,
        ServerStatus::Suspended => MigrationKind::Suspended,
        _ => MigrationKind::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_wire_string() {
        assert_eq!(ServerStatus::from("ACTIVE".to_string()), ServerStatus::Active);
        assert_eq!(
            ServerStatus::from("VERIFY_RESIZE".to_string()),
            ServerStatus::VerifyResize
        );
        assert_eq!(
            ServerStatus::from("RESCUE".to_string()),
            ServerStatus::Other("RESCUE".to_string())
        );
    }

    #[test]
    fn test_status_display_round_trips() {
        for raw in ["ACTIVE", "PAUSED", "SHUTOFF", "SUSPENDED", "MIGRATING", "VERIFY_RESIZE", "ERROR"] {
            let status = ServerStatus::from(raw.to_string());
            assert_eq!(status.to_string(), raw);
        }
    }

    #[test]
    fn test_classify_live() {
        assert_eq!(classify(&ServerStatus::Active), MigrationKind::Live);
        assert_eq!(classify(&ServerStatus::Paused), MigrationKind::Live);
    }

    #[test]
    fn test_classify_cold_and_suspended() {
        assert_eq!(classify(&ServerStatus::Shutoff), MigrationKind::Cold);
        assert_eq!(classify(&ServerStatus::Suspended), MigrationKind::Suspended);
    }

    #[test]
    fn test_classify_unsupported() {
        assert_eq!(classify(&ServerStatus::Migrating), MigrationKind::Unsupported);
        assert_eq!(classify(&ServerStatus::VerifyResize), MigrationKind::Unsupported);
        assert_eq!(
            classify(&ServerStatus::Other("ERROR".to_string())),
            MigrationKind::Unsupported
        );
    }

    #[test]
    fn test_server_deserializes_hypervisor_extension() {
        let json = r#"{
            "id": "4bdee8e7-3659-4adc-9b9a-0c789f7f34ab",
            "name": "web-01",
            "status": "ACTIVE",
            "OS-EXT-SRV-ATTR:hypervisor_hostname": "compute-03"
        }"#;

        let server: Server = serde_json::from_str(json).unwrap();
        assert_eq!(server.name, "web-01");
        assert_eq!(server.status, ServerStatus::Active);
        assert!(server.is_on_host("compute-03"));
        assert!(!server.is_on_host("compute-04"));
    }

    #[test]
    fn test_server_without_extension_attribute() {
        let json = r#"{"id": "abc", "name": "db-01", "status": "SHUTOFF"}"#;
        let server: Server = serde_json::from_str(json).unwrap();
        assert_eq!(server.hypervisor_hostname, None);
        assert!(!server.is_on_host("compute-01"));
    }
}
