//! Compute control-plane client
//!
//! The migration strategies work through the [`ComputeClient`] trait ONLY —
//! never concrete types. [`NovaClient`] is the production implementation
//! against an OpenStack-compatible compute API (Nova v2.1), authenticated
//! once per process via Keystone v3 password auth.

use crate::error::{EvacuationError, Result};
use crate::instance::Server;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

/// Identity token header returned by Keystone
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Token header sent on every compute request
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Every migration command is fire-and-forget: it triggers an async state
/// transition on the control plane, observed only through [`refresh`].
///
/// [`refresh`]: ComputeClient::refresh
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// List all servers hosted on `host`, across all tenants
    async fn list_servers(&self, host: &str) -> Result<Vec<Server>>;

    /// Re-fetch the current state of a server by identity
    async fn refresh(&self, server: &Server) -> Result<Server>;

    /// Start a live migration, optionally to a specific host
    async fn live_migrate(&self, server: &Server, target: Option<&str>) -> Result<()>;

    /// Start a cold migration through the resize flow
    ///
    /// The targeted API version ignores the destination hint for cold
    /// migrations; it is passed through for forward compatibility.
    async fn cold_migrate(&self, server: &Server, target: Option<&str>) -> Result<()>;

    /// Confirm a completed cold migration (leave VERIFY_RESIZE)
    async fn confirm_resize(&self, server: &Server) -> Result<()>;

    /// Resume a suspended server
    async fn resume(&self, server: &Server) -> Result<()>;

    /// Suspend a running server
    async fn suspend(&self, server: &Server) -> Result<()>;
}

/// Credentials and endpoints for Keystone password auth
///
/// Read from the standard `OS_*` environment variables, the same ones the
/// usual `openrc` file exports.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    /// Keystone v3 base URL (`OS_AUTH_URL`)
    pub auth_url: String,
    /// User name (`OS_USERNAME`)
    pub username: String,
    /// Password (`OS_PASSWORD`)
    pub password: String,
    /// Project to scope the token to (`OS_PROJECT_NAME`)
    pub project_name: String,
    /// User domain (`OS_USER_DOMAIN_NAME`, default `Default`)
    pub user_domain: String,
    /// Project domain (`OS_PROJECT_DOMAIN_NAME`, default `Default`)
    pub project_domain: String,
}

impl CloudCredentials {
    /// Read credentials from the environment
    pub fn from_env() -> Result<Self> {
        fn required(key: &str) -> Result<String> {
            std::env::var(key)
                .map_err(|_| EvacuationError::config(format!("{} is not set", key)))
        }

        Ok(Self {
            auth_url: required("OS_AUTH_URL")?,
            username: required("OS_USERNAME")?,
            password: required("OS_PASSWORD")?,
            project_name: required("OS_PROJECT_NAME")?,
            user_domain: std::env::var("OS_USER_DOMAIN_NAME")
                .unwrap_or_else(|_| "Default".to_string()),
            project_domain: std::env::var("OS_PROJECT_DOMAIN_NAME")
                .unwrap_or_else(|_| "Default".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    expires_at: DateTime<Utc>,
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ServersResponse {
    servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
struct ServerResponse {
    server: Server,
}

/// Nova API client with a process-wide authenticated session
pub struct NovaClient {
    http: reqwest::Client,
    compute_url: String,
    token: String,
    token_expires: DateTime<Utc>,
}

impl NovaClient {
    /// Authenticate from `OS_*` environment variables
    pub async fn from_env() -> Result<Self> {
        Self::connect(CloudCredentials::from_env()?).await
    }

    /// Authenticate against Keystone and locate the compute endpoint
    pub async fn connect(creds: CloudCredentials) -> Result<Self> {
        let http = reqwest::Client::new();

        let auth_body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": &creds.username,
                            "domain": {"name": &creds.user_domain},
                            "password": &creds.password,
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": &creds.project_name,
                        "domain": {"name": &creds.project_domain},
                    }
                }
            }
        });

        let url = format!("{}/v3/auth/tokens", creds.auth_url.trim_end_matches('/'));
        debug!("Requesting token from {}", url);

        let response = http.post(&url).json(&auth_body).send().await?;
        if !response.status().is_success() {
            return Err(EvacuationError::auth(format!(
                "Keystone returned {} for {}",
                response.status(),
                creds.username
            )));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| EvacuationError::auth("no subject token in Keystone response"))?;

        let body: TokenResponse = response.json().await?;
        let compute_url = Self::compute_endpoint(&body.token.catalog)?;

        info!(
            "Authenticated against {}, token valid until {}",
            creds.auth_url, body.token.expires_at
        );
        debug!("Compute endpoint: {}", compute_url);

        Ok(Self {
            http,
            compute_url,
            token,
            token_expires: body.token.expires_at,
        })
    }

    /// Pick the public compute endpoint out of the service catalog
    fn compute_endpoint(catalog: &[CatalogEntry]) -> Result<String> {
        catalog
            .iter()
            .find(|entry| entry.service_type == "compute")
            .and_then(|entry| {
                entry
                    .endpoints
                    .iter()
                    .find(|ep| ep.interface == "public")
                    .or_else(|| entry.endpoints.first())
            })
            .map(|ep| ep.url.trim_end_matches('/').to_string())
            .ok_or_else(|| EvacuationError::auth("no compute endpoint in service catalog"))
    }

    /// When the current token expires
    pub fn token_expires(&self) -> DateTime<Utc> {
        self.token_expires
    }

    /// POST a server action (`/servers/{id}/action`)
    async fn server_action(&self, server: &Server, body: serde_json::Value) -> Result<()> {
        let url = format!("{}/servers/{}/action", self.compute_url, server.id);
        debug!(server = %server.name, "POST {}", url);

        self.http
            .post(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[async_trait]
impl ComputeClient for NovaClient {
    async fn list_servers(&self, host: &str) -> Result<Vec<Server>> {
        let url = format!("{}/servers/detail", self.compute_url);

        let response = self
            .http
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .query(&[("host", host), ("all_tenants", "1")])
            .send()
            .await?
            .error_for_status()?;

        let body: ServersResponse = response.json().await?;
        Ok(body.servers)
    }

    async fn refresh(&self, server: &Server) -> Result<Server> {
        let url = format!("{}/servers/{}", self.compute_url, server.id);

        let response = self
            .http
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .await?
            .error_for_status()?;

        let body: ServerResponse = response.json().await?;
        Ok(body.server)
    }

    async fn live_migrate(&self, server: &Server, target: Option<&str>) -> Result<()> {
        self.server_action(
            server,
            json!({
                "os-migrateLive": {
                    "host": target,
                    "block_migration": false,
                    "disk_over_commit": false,
                }
            }),
        )
        .await
    }

    async fn cold_migrate(&self, server: &Server, target: Option<&str>) -> Result<()> {
        let body = match target {
            Some(host) => json!({"migrate": {"host": host}}),
            None => json!({"migrate": null}),
        };
        self.server_action(server, body).await
    }

    async fn confirm_resize(&self, server: &Server) -> Result<()> {
        self.server_action(server, json!({"confirmResize": null})).await
    }

    async fn resume(&self, server: &Server) -> Result<()> {
        self.server_action(server, json!({"resume": null})).await
    }

    async fn suspend(&self, server: &Server) -> Result<()> {
        self.server_action(server, json!({"suspend": null})).await
    }
}
