//! Run-list expansion: the role-resolution walk.
//!
//! One expansion instance handles one pass: it walks the node's run-list
//! items depth-first and left-to-right, appending recipes to a
//! [`VersionedRecipeList`] and inflating role items through the injected
//! [`RoleFetcher`]. A role's nested run list (filtered by environment) is
//! fully drained before the role's attribute trees are merged in, so roles
//! that appear later in the walk merge on top of roles applied earlier.
//!
//! A role is marked applied before its children are walked; re-encountering
//! it anywhere afterwards is a no-op, which both deduplicates diamond
//! includes and guarantees termination on include cycles.
//!
//! The walk is iterative (explicit frame stack) rather than recursive, so
//! pathological role graphs cannot overflow the call stack, and fetches stay
//! strictly sequential: the result is deterministic for a given run list and
//! set of fetch responses.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, error};

use galley_attr::deep_merge_into;

use crate::error::{FetchError, Result, RunListError};
use crate::fetch::RoleFetcher;
use crate::item::{ItemKind, RunListItem};
use crate::recipe_list::VersionedRecipeList;

/// Trace label for items declared on the node itself rather than pulled in
/// by a role.
pub const TOP_LEVEL: &str = "top level";

/// One in-progress run list in the walk: who included it, the items left to
/// process, and the attribute trees to merge once it drains.
struct Frame {
    includer: String,
    items: Vec<RunListItem>,
    next: usize,
    /// `(default, override)` trees of the role that owns this frame; the
    /// top-level frame has none.
    role_attrs: Option<(Value, Value)>,
}

/// Working state and final result of one expansion pass.
///
/// Construct with the environment, the top-level items, and a fetch backend;
/// call [`expand`](Self::expand) once; read the accessors. Instances are not
/// reused across expansions.
pub struct RunListExpansion<'a> {
    environment: String,
    run_list_items: Vec<RunListItem>,
    fetcher: &'a dyn RoleFetcher,
    recipes: VersionedRecipeList,
    default_attrs: Value,
    override_attrs: Value,
    applied_roles: HashSet<String>,
    missing_roles_with_including_role: Vec<(String, String)>,
    run_list_trace: BTreeMap<String, Vec<String>>,
}

impl std::fmt::Debug for RunListExpansion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunListExpansion")
            .field("environment", &self.environment)
            .field("run_list_items", &self.run_list_items)
            .field("recipes", &self.recipes)
            .field("default_attrs", &self.default_attrs)
            .field("override_attrs", &self.override_attrs)
            .field("applied_roles", &self.applied_roles)
            .field(
                "missing_roles_with_including_role",
                &self.missing_roles_with_including_role,
            )
            .field("run_list_trace", &self.run_list_trace)
            .finish_non_exhaustive()
    }
}

impl<'a> RunListExpansion<'a> {
    pub fn new(
        environment: impl Into<String>,
        run_list_items: Vec<RunListItem>,
        fetcher: &'a dyn RoleFetcher,
    ) -> Self {
        RunListExpansion {
            environment: environment.into(),
            run_list_items,
            fetcher,
            recipes: VersionedRecipeList::new(),
            default_attrs: Value::Object(Map::new()),
            override_attrs: Value::Object(Map::new()),
            applied_roles: HashSet::new(),
            missing_roles_with_including_role: Vec::new(),
            run_list_trace: BTreeMap::new(),
        }
    }

    /// Run the expansion to completion.
    ///
    /// Returns `Err` only for version conflicts and fetch faults other than
    /// "role not found"; missing roles are logged, recorded in
    /// [`errors`](Self::errors), and skipped.
    pub async fn expand(&mut self) -> Result<()> {
        let top_level = std::mem::take(&mut self.run_list_items);
        let mut stack = vec![Frame {
            includer: TOP_LEVEL.to_string(),
            items: top_level,
            next: 0,
            role_attrs: None,
        }];

        loop {
            let Some(frame) = stack.last_mut() else { break };

            if frame.next >= frame.items.len() {
                // Frame drained. A role's attributes merge only now, after
                // everything it pulled in, so later-walked roles win.
                if let Some(done) = stack.pop() {
                    if let Some((default, overrides)) = done.role_attrs {
                        deep_merge_into(&mut self.default_attrs, &default);
                        deep_merge_into(&mut self.override_attrs, &overrides);
                    }
                }
                continue;
            }

            let item = frame.items[frame.next].clone();
            frame.next += 1;
            let includer = frame.includer.clone();

            self.run_list_trace
                .entry(includer.clone())
                .or_default()
                .push(item.to_string());

            match item.kind() {
                ItemKind::Recipe => {
                    self.recipes.add_recipe(item.name(), item.version())?;
                }
                ItemKind::Role => {
                    if let Some(frame) = self.inflate_role(&item, &includer).await? {
                        stack.push(frame);
                    }
                }
            }
        }

        Ok(())
    }

    /// Resolve a role item into a new walk frame.
    ///
    /// Returns `None` when the role is already applied or cannot be found.
    /// The applied mark is set before fetching, so each distinct role is
    /// fetched at most once per expansion, cycles included.
    async fn inflate_role(
        &mut self,
        item: &RunListItem,
        includer: &str,
    ) -> Result<Option<Frame>> {
        if self.applied_roles.contains(item.name()) {
            debug!(role = %item.name(), "role already applied, skipping");
            return Ok(None);
        }
        self.applied_roles.insert(item.name().to_string());

        let role = match self.fetcher.fetch_role(item.name()).await {
            Ok(role) => role,
            Err(FetchError::NotFound { .. }) => {
                self.role_not_found(item.name(), includer);
                return Ok(None);
            }
            Err(fatal) => return Err(RunListError::Fetch(fatal)),
        };

        let items = role.run_list_for(&self.environment).items().to_vec();
        debug!(
            role = %item.name(),
            environment = %self.environment,
            entries = items.len(),
            "expanding role run list"
        );
        Ok(Some(Frame {
            includer: item.to_string(),
            items,
            next: 0,
            role_attrs: Some((role.default_attributes, role.override_attributes)),
        }))
    }

    fn role_not_found(&mut self, name: &str, includer: &str) {
        error!(
            role = %name,
            included_by = %includer,
            "role is in the run list but does not exist, skipping expand"
        );
        self.missing_roles_with_including_role
            .push((name.to_string(), includer.to_string()));
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The expanded recipes, in first-encountered depth-first order.
    pub fn recipes(&self) -> &VersionedRecipeList {
        &self.recipes
    }

    /// Merged default attribute tree of every applied role.
    pub fn default_attrs(&self) -> &Value {
        &self.default_attrs
    }

    /// Merged override attribute tree of every applied role.
    pub fn override_attrs(&self) -> &Value {
        &self.override_attrs
    }

    /// Names of the roles actually applied. Unordered.
    pub fn roles(&self) -> &HashSet<String> {
        &self.applied_roles
    }

    /// Whether any role in the run list could not be found.
    pub fn has_errors(&self) -> bool {
        !self.missing_roles_with_including_role.is_empty()
    }

    /// Missing role names, in encounter order.
    pub fn errors(&self) -> Vec<&str> {
        self.missing_roles_with_including_role
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// `(missing-role, including-context)` pairs, in encounter order.
    pub fn missing_roles_with_including_role(&self) -> &[(String, String)] {
        &self.missing_roles_with_including_role
    }

    /// The inclusion graph: each including context mapped to the item
    /// renderings it directly listed, in order. Roles skipped as
    /// already-applied still appear under their second includer.
    pub fn run_list_trace(&self) -> &BTreeMap<String, Vec<String>> {
        &self.run_list_trace
    }

    /// The trace rendered as a nested JSON tree rooted at the top level,
    /// for tooling and "why did this recipe run" debugging.
    ///
    /// Each node is either a plain item string or a one-entry map from a
    /// role rendering to its children. A role's children appear under its
    /// first inclusion only; later references render as leaves.
    pub fn trace_tree(&self) -> Value {
        let mut expanded: HashSet<&str> = HashSet::new();
        self.subtree(TOP_LEVEL, &mut expanded)
    }

    fn subtree<'t>(&'t self, includer: &str, expanded: &mut HashSet<&'t str>) -> Value {
        let children = match self.run_list_trace.get(includer) {
            Some(children) => children,
            None => return Value::Array(Vec::new()),
        };
        let nodes = children
            .iter()
            .map(|child| {
                if self.run_list_trace.contains_key(child.as_str())
                    && expanded.insert(child.as_str())
                {
                    let mut node = Map::new();
                    node.insert(child.clone(), self.subtree(child, expanded));
                    Value::Object(node)
                } else {
                    Value::String(child.clone())
                }
            })
            .collect();
        Value::Array(nodes)
    }
}
