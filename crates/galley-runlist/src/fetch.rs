//! Role-fetch strategies.
//!
//! The expansion engine only needs one capability, `fetch_role`; where role
//! definitions live is a backend decision made by the caller at construction
//! time. Two backends ship here: local role files on disk and the server
//! HTTP API.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::role::RoleDefinition;

/// Result type for role-fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// A source of role definitions.
#[async_trait]
pub trait RoleFetcher: Send + Sync {
    /// Fetch the definition of the role called `name`.
    ///
    /// Must return [`FetchError::NotFound`] when the backend has no such
    /// role; the expansion recovers from that and nothing else.
    async fn fetch_role(&self, name: &str) -> FetchResult<RoleDefinition>;
}

/// Reads role definitions from `<role_dir>/<name>.json`.
///
/// A missing file and an unparseable document are both reported as
/// [`FetchError::NotFound`]; any other I/O fault propagates as fatal.
#[derive(Debug, Clone)]
pub struct DiskRoleFetcher {
    role_dir: PathBuf,
}

impl DiskRoleFetcher {
    pub fn new(role_dir: impl Into<PathBuf>) -> Self {
        DiskRoleFetcher {
            role_dir: role_dir.into(),
        }
    }

    fn role_path(&self, name: &str) -> PathBuf {
        self.role_dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl RoleFetcher for DiskRoleFetcher {
    async fn fetch_role(&self, name: &str) -> FetchResult<RoleDefinition> {
        let path = self.role_path(name);
        debug!(role = %name, path = %path.display(), "loading role from disk");

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => {
                return Err(FetchError::Io {
                    name: name.to_string(),
                    source: e,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(role = %name, error = %e, "role file failed to parse, treating as missing");
            FetchError::NotFound {
                name: name.to_string(),
            }
        })
    }
}

/// Fetches role definitions from the server API: `GET {base}/roles/{name}`.
///
/// A 404 response is the not-found condition; every other HTTP failure is
/// fatal and propagates to the expansion's caller. No retries here; that is
/// the transport layer's business.
#[derive(Debug, Clone)]
pub struct ApiRoleFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl ApiRoleFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("galley-runlist/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");
        Self::with_client(client, base_url)
    }

    /// Use a caller-configured client (auth headers, timeouts, proxies).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        ApiRoleFetcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn role_url(&self, name: &str) -> String {
        format!("{}/roles/{}", self.base_url, name)
    }
}

#[async_trait]
impl RoleFetcher for ApiRoleFetcher {
    async fn fetch_role(&self, name: &str) -> FetchResult<RoleDefinition> {
        let url = self.role_url(name);
        debug!(role = %name, url = %url, "fetching role from server");

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Http {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                name: name.to_string(),
            });
        }

        let response = response.error_for_status().map_err(|e| FetchError::Http {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        response
            .json::<RoleDefinition>()
            .await
            .map_err(|e| FetchError::Http {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}
