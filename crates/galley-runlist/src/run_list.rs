//! The ordered run-list container attached to a node or role.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expansion::RunListExpansion;
use crate::fetch::RoleFetcher;
use crate::item::RunListItem;

/// An ordered sequence of run-list items, deduplicated on insert.
///
/// Serializes as an array of canonical item strings; deserializes from any
/// mix of strings and structured records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunList {
    items: Vec<RunListItem>,
}

impl RunList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a sequence of string entries into a run list.
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run_list = RunList::new();
        for entry in entries {
            run_list.add(entry.as_ref().parse()?);
        }
        Ok(run_list)
    }

    /// Append `item` unless an equal item is already present.
    ///
    /// Returns whether the item was inserted.
    pub fn add(&mut self, item: RunListItem) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Parse and append a string entry.
    pub fn add_entry(&mut self, entry: &str) -> Result<bool> {
        Ok(self.add(entry.parse()?))
    }

    pub fn items(&self) -> &[RunListItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunListItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the list contains `entry`, compared by canonical rendering,
    /// so `"needy"` matches an item added as `"recipe[needy]"` and vice
    /// versa.
    pub fn contains_entry(&self, entry: &str) -> bool {
        let canonical = entry
            .parse::<RunListItem>()
            .map(|item| item.to_string())
            .unwrap_or_else(|_| entry.to_string());
        self.items.iter().any(|item| *item == *canonical)
    }

    /// Names of recipe items, in order, without versions.
    pub fn recipe_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.is_recipe())
            .map(RunListItem::name)
            .collect()
    }

    /// Names of role items, in order.
    pub fn role_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.is_role())
            .map(RunListItem::name)
            .collect()
    }

    /// Expand this run list for `environment`, resolving roles through
    /// `fetcher`.
    ///
    /// Missing roles do not fail the expansion (check
    /// [`RunListExpansion::has_errors`]); version conflicts and non-not-found
    /// fetch faults do.
    pub async fn expand<'a>(
        &self,
        environment: &str,
        fetcher: &'a dyn RoleFetcher,
    ) -> Result<RunListExpansion<'a>> {
        let mut expansion = RunListExpansion::new(environment, self.items.clone(), fetcher);
        expansion.expand().await?;
        Ok(expansion)
    }
}

impl fmt::Display for RunList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.items.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}

impl FromIterator<RunListItem> for RunList {
    fn from_iter<I: IntoIterator<Item = RunListItem>>(iter: I) -> Self {
        let mut run_list = RunList::new();
        for item in iter {
            run_list.add(item);
        }
        run_list
    }
}

impl<'a> IntoIterator for &'a RunList {
    type Item = &'a RunListItem;
    type IntoIter = std::slice::Iter<'a, RunListItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
