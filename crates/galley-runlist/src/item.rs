//! Run-list entry parsing and rendering.
//!
//! Accepted string grammars, tried in order:
//!
//! 1. `recipe[NAME]` / `recipe[NAME@X.Y]` / `recipe[NAME@X.Y.Z]`
//! 2. `role[NAME]`
//! 3. `NAME@X.Y` / `NAME@X.Y.Z`
//! 4. any other string containing `[` or `]` is rejected as a near-miss
//!    (catches typos like `Recipe[x]` or `roles[x]` before they are taken
//!    for bare recipe names)
//! 5. anything else is a bare recipe name
//!
//! The canonical rendering is always bracket-qualified: `recipe[name]`,
//! `recipe[name@1.2.3]`, `role[name]`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, RunListError};

static QUALIFIED_RECIPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^recipe\[([^\]@]+)(?:@([0-9]+(?:\.[0-9]+){1,2}))?\]$").unwrap()
});
static QUALIFIED_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^role\[([^\]]+)\]$").unwrap());
static VERSIONED_UNQUALIFIED_RECIPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^@\[\]]+)@([0-9]+(?:\.[0-9]+){1,2})$").unwrap());
static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+){1,2}$").unwrap());

/// Whether a run-list entry names a recipe or a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Recipe,
    Role,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Recipe => write!(f, "recipe"),
            ItemKind::Role => write!(f, "role"),
        }
    }
}

/// One run-list entry: a recipe (optionally version-pinned) or a role.
///
/// Immutable after construction. A role never carries a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunListItem {
    kind: ItemKind,
    name: String,
    version: Option<String>,
}

impl RunListItem {
    /// An unversioned recipe item.
    pub fn recipe(name: impl Into<String>) -> Self {
        RunListItem {
            kind: ItemKind::Recipe,
            name: name.into(),
            version: None,
        }
    }

    /// A role item.
    pub fn role(name: impl Into<String>) -> Self {
        RunListItem {
            kind: ItemKind::Role,
            name: name.into(),
            version: None,
        }
    }

    /// Construct from a structured record: a JSON map with required `type`
    /// and `name` fields and an optional `version` (recipes only).
    pub fn from_record(record: &Value) -> Result<Self> {
        let malformed = |reason: &str| RunListError::MalformedItem {
            item: record.to_string(),
            reason: reason.to_string(),
        };

        let map = record
            .as_object()
            .ok_or_else(|| malformed("record must be a map"))?;
        let kind = match map.get("type").and_then(Value::as_str) {
            Some("recipe") => ItemKind::Recipe,
            Some("role") => ItemKind::Role,
            Some(_) => return Err(malformed("type must be \"recipe\" or \"role\"")),
            None => return Err(malformed("missing required field: type")),
        };
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing required field: name"))?
            .to_string();
        let version = match map.get("version").filter(|v| !v.is_null()) {
            Some(raw) => {
                let raw = raw
                    .as_str()
                    .ok_or_else(|| malformed("version must be a string"))?;
                if kind == ItemKind::Role {
                    return Err(malformed("role items cannot carry a version"));
                }
                if !VERSION.is_match(raw) {
                    return Err(malformed(
                        "version must be 2-3 dot-separated numeric components",
                    ));
                }
                Some(raw.to_string())
            }
            None => None,
        };

        Ok(RunListItem {
            kind,
            name,
            version,
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pinned version, recipes only.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_recipe(&self) -> bool {
        self.kind == ItemKind::Recipe
    }

    pub fn is_role(&self) -> bool {
        self.kind == ItemKind::Role
    }
}

impl FromStr for RunListItem {
    type Err = RunListError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(caps) = QUALIFIED_RECIPE.captures(s) {
            return Ok(RunListItem {
                kind: ItemKind::Recipe,
                name: caps[1].to_string(),
                version: caps.get(2).map(|m| m.as_str().to_string()),
            });
        }
        if let Some(caps) = QUALIFIED_ROLE.captures(s) {
            return Ok(RunListItem::role(&caps[1]));
        }
        if let Some(caps) = VERSIONED_UNQUALIFIED_RECIPE.captures(s) {
            return Ok(RunListItem {
                kind: ItemKind::Recipe,
                name: caps[1].to_string(),
                version: Some(caps[2].to_string()),
            });
        }
        // Near-miss guard: stray brackets mean a botched qualifier, not a
        // recipe whose name happens to contain brackets.
        if s.contains('[') || s.contains(']') {
            return Err(RunListError::MalformedItem {
                item: s.to_string(),
                reason: "must be recipe[name], recipe[name@x.y.z], role[name], \
                         name@x.y.z, or a bare recipe name"
                    .to_string(),
            });
        }
        Ok(RunListItem::recipe(s))
    }
}

impl fmt::Display for RunListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}[{}@{}]", self.kind, self.name, version),
            None => write!(f, "{}[{}]", self.kind, self.name),
        }
    }
}

impl PartialEq<str> for RunListItem {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for RunListItem {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for RunListItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RunListItem {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) => s.parse().map_err(D::Error::custom),
            Value::Object(_) => RunListItem::from_record(&value).map_err(D::Error::custom),
            _ => Err(D::Error::custom(
                "run list item must be a string or a record",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(s: &str) -> RunListItem {
        s.parse().unwrap()
    }

    #[test]
    fn qualified_recipe_parses() {
        let i = item("recipe[rage]");
        assert!(i.is_recipe());
        assert_eq!(i.name(), "rage");
        assert_eq!(i.version(), None);
    }

    #[test]
    fn qualified_recipe_with_version_parses() {
        let i = item("recipe[rage@0.1.0]");
        assert_eq!(i.name(), "rage");
        assert_eq!(i.version(), Some("0.1.0"));

        let i = item("recipe[fist@0.1]");
        assert_eq!(i.version(), Some("0.1"));
    }

    #[test]
    fn qualified_role_parses() {
        let i = item("role[base]");
        assert!(i.is_role());
        assert_eq!(i.name(), "base");
        assert_eq!(i.version(), None);
    }

    #[test]
    fn versioned_unqualified_recipe_parses() {
        let i = item("rage@0.2.0");
        assert!(i.is_recipe());
        assert_eq!(i.name(), "rage");
        assert_eq!(i.version(), Some("0.2.0"));
    }

    #[test]
    fn bare_name_is_a_recipe() {
        let i = item("lobster");
        assert!(i.is_recipe());
        assert_eq!(i.name(), "lobster");
    }

    #[test]
    fn namespaced_recipe_names_pass_through() {
        let i = item("recipe[nagios::client]");
        assert_eq!(i.name(), "nagios::client");
        assert_eq!(i.to_string(), "recipe[nagios::client]");
    }

    #[test]
    fn near_miss_qualifiers_are_rejected() {
        for bad in [
            "Recipe[lobster]",
            "roles[foo]",
            "recipe [lobster]",
            "recipe[lobster",
            "recipe]lobster[",
            "[lobster]",
        ] {
            let err = bad.parse::<RunListItem>().unwrap_err();
            assert!(
                matches!(err, RunListError::MalformedItem { .. }),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn canonical_rendering_round_trips() {
        for s in [
            "recipe[lobster]",
            "recipe[rage@0.1.0]",
            "recipe[fist@0.1]",
            "role[mollusk]",
        ] {
            assert_eq!(item(s).to_string(), s);
        }
        // Bare and unqualified forms normalize to the bracketed rendering.
        assert_eq!(item("lobster").to_string(), "recipe[lobster]");
        assert_eq!(item("rage@0.2.0").to_string(), "recipe[rage@0.2.0]");
    }

    #[test]
    fn compares_against_canonical_strings() {
        assert_eq!(item("lobster"), *"recipe[lobster]");
        assert_eq!(item("role[base]"), "role[base]");
        assert_ne!(item("recipe[a]"), "recipe[b]");
    }

    #[test]
    fn equality_includes_version() {
        assert_eq!(item("recipe[a@1.0]"), item("recipe[a@1.0]"));
        assert_ne!(item("recipe[a@1.0]"), item("recipe[a@2.0]"));
        assert_ne!(item("recipe[a]"), item("role[a]"));
    }

    #[test]
    fn record_construction() {
        let i = RunListItem::from_record(&json!({"type": "recipe", "name": "apache2"})).unwrap();
        assert_eq!(i, item("recipe[apache2]"));

        let i = RunListItem::from_record(
            &json!({"type": "recipe", "name": "apache2", "version": "1.2.3"}),
        )
        .unwrap();
        assert_eq!(i.version(), Some("1.2.3"));

        let i = RunListItem::from_record(&json!({"type": "role", "name": "base"})).unwrap();
        assert!(i.is_role());
    }

    #[test]
    fn record_requires_type_and_name() {
        assert!(RunListItem::from_record(&json!({"name": "apache2"})).is_err());
        assert!(RunListItem::from_record(&json!({"type": "recipe"})).is_err());
        assert!(RunListItem::from_record(&json!({"type": "cookbook", "name": "x"})).is_err());
    }

    #[test]
    fn record_rejects_versioned_roles_and_bad_versions() {
        assert!(RunListItem::from_record(
            &json!({"type": "role", "name": "base", "version": "1.0.0"})
        )
        .is_err());
        assert!(RunListItem::from_record(
            &json!({"type": "recipe", "name": "x", "version": "banana"})
        )
        .is_err());
    }

    #[test]
    fn serde_round_trip_uses_canonical_strings() {
        let i = item("recipe[rage@0.1.0]");
        let encoded = serde_json::to_string(&i).unwrap();
        assert_eq!(encoded, "\"recipe[rage@0.1.0]\"");
        let decoded: RunListItem = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, i);

        // Records deserialize too.
        let decoded: RunListItem =
            serde_json::from_value(json!({"type": "role", "name": "base"})).unwrap();
        assert_eq!(decoded, item("role[base]"));
    }
}
