//! Role definitions as returned by a fetch backend.
//!
//! Roles are transient values to the expansion: fetched, read, and dropped.
//! The serde model matches the role JSON document shape used by the server
//! API and by on-disk role files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::run_list::RunList;

/// Name of the environment a node falls back to when it has none of its own,
/// and the key under which a role's default run list may appear in
/// `env_run_lists`.
pub const DEFAULT_ENVIRONMENT: &str = "_default";

fn empty_tree() -> Value {
    Value::Object(Map::new())
}

/// A role: a named grouping of run-list entries plus attribute contributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleDefinition {
    pub name: String,
    pub description: String,
    /// Run list applied in environments without an entry in
    /// `env_run_lists`.
    pub run_list: RunList,
    /// Per-environment run lists overriding `run_list`.
    pub env_run_lists: BTreeMap<String, RunList>,
    #[serde(default = "empty_tree")]
    pub default_attributes: Value,
    #[serde(default = "empty_tree")]
    pub override_attributes: Value,
}

impl Default for RoleDefinition {
    fn default() -> Self {
        RoleDefinition {
            name: String::new(),
            description: String::new(),
            run_list: RunList::new(),
            env_run_lists: BTreeMap::new(),
            default_attributes: empty_tree(),
            override_attributes: empty_tree(),
        }
    }
}

impl RoleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        RoleDefinition {
            name: name.into(),
            ..RoleDefinition::default()
        }
    }

    pub fn with_run_list(mut self, run_list: RunList) -> Self {
        self.run_list = run_list;
        self
    }

    pub fn with_env_run_list(mut self, environment: impl Into<String>, run_list: RunList) -> Self {
        self.env_run_lists.insert(environment.into(), run_list);
        self
    }

    pub fn with_default_attributes(mut self, attrs: Value) -> Self {
        self.default_attributes = attrs;
        self
    }

    pub fn with_override_attributes(mut self, attrs: Value) -> Self {
        self.override_attributes = attrs;
        self
    }

    /// The run list to expand in `environment`: the environment-specific
    /// list when the role defines one, the default list otherwise.
    pub fn run_list_for(&self, environment: &str) -> &RunList {
        self.env_run_lists
            .get(environment)
            .unwrap_or(&self.run_list)
    }
}
