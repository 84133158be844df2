//! Ordered, deduplicated recipe accumulation with version pins.
//!
//! Execution order matters, so the list preserves first-encounter order; a
//! recipe pulled in by several roles still runs once. A recipe may carry at
//! most one pinned version; pinning the same recipe to two different versions
//! is a configuration error surfaced immediately.

use std::collections::HashMap;

use crate::error::{Result, RunListError};
use crate::version::VersionConstraint;

/// Recipe names in first-encounter order plus a side map of version pins.
#[derive(Debug, Clone, Default)]
pub struct VersionedRecipeList {
    recipes: Vec<String>,
    versions: HashMap<String, String>,
}

impl VersionedRecipeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` if unseen, recording its version pin when given.
    ///
    /// Re-adding a known name with no version (or an equal version, where
    /// `1.0` equals `1.0.0`) is a no-op. A differing version is a
    /// [`RunListError::VersionConflict`].
    pub fn add_recipe(&mut self, name: &str, version: Option<&str>) -> Result<()> {
        if let Some(version) = version {
            let proposed: VersionConstraint = version.parse()?;
            if let Some(existing) = self.versions.get(name) {
                let recorded: VersionConstraint = existing.parse()?;
                if recorded != proposed {
                    return Err(RunListError::VersionConflict {
                        recipe: name.to_string(),
                        existing: existing.clone(),
                        proposed: version.to_string(),
                    });
                }
            } else {
                self.versions.insert(name.to_string(), version.to_string());
            }
        }
        if !self.recipes.iter().any(|r| r == name) {
            self.recipes.push(name.to_string());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recipes.iter().any(|r| r == name)
    }

    /// Recipe names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.recipes
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(String::as_str)
    }

    /// `(name, pinned-version)` pairs in insertion order.
    pub fn with_versions(&self) -> Vec<(&str, Option<&str>)> {
        self.recipes
            .iter()
            .map(|name| (name.as_str(), self.versions.get(name).map(String::as_str)))
            .collect()
    }

    /// `(name, constraint)` pairs; unpinned entries get the open constraint.
    ///
    /// Cannot fail: version strings are validated on the way in.
    pub fn with_version_constraints(&self) -> Vec<(&str, VersionConstraint)> {
        self.recipes
            .iter()
            .map(|name| {
                let constraint = self
                    .versions
                    .get(name)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(VersionConstraint::Any);
                (name.as_str(), constraint)
            })
            .collect()
    }

    /// `name` or `name@version` strings in insertion order.
    pub fn with_version_constraint_strings(&self) -> Vec<String> {
        self.recipes
            .iter()
            .map(|name| match self.versions.get(name) {
                Some(version) => format!("{name}@{version}"),
                None => name.clone(),
            })
            .collect()
    }

    /// Like [`with_version_constraint_strings`], but bare cookbook names are
    /// qualified with `::default` before the version suffix is appended.
    ///
    /// [`with_version_constraint_strings`]: Self::with_version_constraint_strings
    pub fn with_fully_qualified_names_and_version_constraints(&self) -> Vec<String> {
        self.recipes
            .iter()
            .map(|name| {
                let qualified = if name.contains("::") {
                    name.clone()
                } else {
                    format!("{name}::default")
                };
                match self.versions.get(name) {
                    Some(version) => format!("{qualified}@{version}"),
                    None => qualified,
                }
            })
            .collect()
    }

    /// Expand every entry to both its bare and `::default` spellings.
    ///
    /// `a` and `a::default` each become the pair `[a, a::default]`;
    /// fully-qualified non-default entries (`a::b`) pass through unchanged.
    pub fn with_duplicate_names(&self) -> Vec<String> {
        self.recipes
            .iter()
            .flat_map(|name| {
                if let Some(base) = name.strip_suffix("::default") {
                    vec![base.to_string(), name.clone()]
                } else if name.contains("::") {
                    vec![name.clone()]
                } else {
                    vec![name.clone(), format!("{name}::default")]
                }
            })
            .collect()
    }
}
