//! In-memory fake for the role-fetch trait (testing only).
//!
//! Satisfies the [`RoleFetcher`] contract without disk or network, and
//! counts fetches per role so tests can assert the fetch-once guarantee.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::fetch::{FetchResult, RoleFetcher};
use crate::role::RoleDefinition;

/// Role store backed by a `HashMap<name, RoleDefinition>`.
///
/// Unknown names report [`FetchError::NotFound`]; a name registered with
/// [`fail_with_http_error`](Self::fail_with_http_error) reports a fatal
/// transport fault instead.
#[derive(Debug, Default)]
pub struct InMemoryRoleFetcher {
    roles: HashMap<String, RoleDefinition>,
    broken_roles: Vec<String>,
    fetch_counts: Mutex<HashMap<String, usize>>,
}

impl InMemoryRoleFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: RoleDefinition) -> Self {
        self.roles.insert(role.name.clone(), role);
        self
    }

    /// Make fetches of `name` fail with a non-not-found transport error.
    pub fn fail_with_http_error(mut self, name: impl Into<String>) -> Self {
        self.broken_roles.push(name.into());
        self
    }

    /// How many times `name` has been fetched.
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetch_counts
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RoleFetcher for InMemoryRoleFetcher {
    async fn fetch_role(&self, name: &str) -> FetchResult<RoleDefinition> {
        *self
            .fetch_counts
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += 1;

        if self.broken_roles.iter().any(|r| r == name) {
            return Err(FetchError::Http {
                name: name.to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        self.roles
            .get(name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                name: name.to_string(),
            })
    }
}
