//! Cookbook version numbers and version constraints.
//!
//! Versions are 2- or 3-component dotted numerics. A missing patch component
//! compares as zero, so `1.0` and `1.0.0` are the same version but render
//! differently.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::RunListError;

/// A cookbook version: `major.minor` or `major.minor.patch`.
#[derive(Debug, Clone, Eq)]
pub struct CookbookVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: Option<u64>,
}

impl CookbookVersion {
    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl PartialEq for CookbookVersion {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Ord for CookbookVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl PartialOrd for CookbookVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_component(raw: &str, whole: &str) -> Result<u64, RunListError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RunListError::InvalidVersion(whole.to_string()));
    }
    raw.parse()
        .map_err(|_| RunListError::InvalidVersion(whole.to_string()))
}

impl FromStr for CookbookVersion {
    type Err = RunListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(RunListError::InvalidVersion(s.to_string()));
        }
        let major = parse_component(parts[0], s)?;
        let minor = parse_component(parts[1], s)?;
        let patch = match parts.get(2) {
            Some(raw) => Some(parse_component(raw, s)?),
            None => None,
        };
        Ok(CookbookVersion {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for CookbookVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Comparison operator of a version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    /// `~>`: at least the given version, below the next minor (or major,
    /// for two-component versions) bump.
    Pessimistic,
}

impl ConstraintOp {
    fn as_str(self) -> &'static str {
        match self {
            ConstraintOp::Eq => "=",
            ConstraintOp::Gt => ">",
            ConstraintOp::GtEq => ">=",
            ConstraintOp::Lt => "<",
            ConstraintOp::LtEq => "<=",
            ConstraintOp::Pessimistic => "~>",
        }
    }
}

/// A constraint on a cookbook version.
///
/// A bare version string means exact match; an absent version means any.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionConstraint {
    Any,
    Op {
        op: ConstraintOp,
        version: CookbookVersion,
    },
}

impl VersionConstraint {
    /// Exact-match constraint on `version`.
    pub fn exact(version: CookbookVersion) -> Self {
        VersionConstraint::Op {
            op: ConstraintOp::Eq,
            version,
        }
    }

    /// Whether `candidate` satisfies this constraint.
    pub fn matches(&self, candidate: &CookbookVersion) -> bool {
        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Op { op, version } => match op {
                ConstraintOp::Eq => candidate == version,
                ConstraintOp::Gt => candidate > version,
                ConstraintOp::GtEq => candidate >= version,
                ConstraintOp::Lt => candidate < version,
                ConstraintOp::LtEq => candidate <= version,
                ConstraintOp::Pessimistic => {
                    let ceiling = match version.patch {
                        Some(_) => CookbookVersion {
                            major: version.major,
                            minor: version.minor + 1,
                            patch: Some(0),
                        },
                        None => CookbookVersion {
                            major: version.major + 1,
                            minor: 0,
                            patch: Some(0),
                        },
                    };
                    candidate >= version && *candidate < ceiling
                }
            },
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = RunListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RunListError::InvalidVersion(s.to_string()));
        }
        let (op, rest) = if let Some(rest) = s.strip_prefix("~>") {
            (Some(ConstraintOp::Pessimistic), rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (Some(ConstraintOp::GtEq), rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (Some(ConstraintOp::LtEq), rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Some(ConstraintOp::Gt), rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Some(ConstraintOp::Lt), rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (Some(ConstraintOp::Eq), rest)
        } else {
            (None, s)
        };
        let version: CookbookVersion = rest
            .trim()
            .parse()
            .map_err(|_| RunListError::InvalidVersion(s.to_string()))?;
        Ok(VersionConstraint::Op {
            op: op.unwrap_or(ConstraintOp::Eq),
            version,
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => write!(f, ">= 0.0.0"),
            VersionConstraint::Op { op, version } => write!(f, "{} {}", op.as_str(), version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> CookbookVersion {
        s.parse().unwrap()
    }

    #[test]
    fn two_and_three_component_versions_parse() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("0.10.4").triple(), (0, 10, 4));
    }

    #[test]
    fn components_compare_numerically_not_lexically() {
        assert!(v("1.10") > v("1.2"));
        assert!(v("1.2.10") > v("1.2.9"));
    }

    #[test]
    fn malformed_versions_are_rejected() {
        for bad in ["1", "1.0.0.0", "1.a", "a.b", "", "1.", "+1.0", "1.0-rc1"] {
            assert!(
                bad.parse::<CookbookVersion>().is_err(),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn display_preserves_component_count() {
        assert_eq!(v("1.0").to_string(), "1.0");
        assert_eq!(v("1.0.0").to_string(), "1.0.0");
    }

    #[test]
    fn bare_version_is_exact_constraint() {
        let c: VersionConstraint = "1.2.3".parse().unwrap();
        assert_eq!(c, VersionConstraint::exact(v("1.2.3")));
        assert!(c.matches(&v("1.2.3")));
        assert!(!c.matches(&v("1.2.4")));
    }

    #[test]
    fn operator_constraints_parse_and_match() {
        let c: VersionConstraint = ">= 1.0".parse().unwrap();
        assert!(c.matches(&v("1.0.0")));
        assert!(c.matches(&v("2.0.0")));
        assert!(!c.matches(&v("0.9.9")));

        let c: VersionConstraint = "< 2.0".parse().unwrap();
        assert!(c.matches(&v("1.9.9")));
        assert!(!c.matches(&v("2.0.0")));
    }

    #[test]
    fn pessimistic_constraint_bounds_the_next_release() {
        let c: VersionConstraint = "~> 1.2.0".parse().unwrap();
        assert!(c.matches(&v("1.2.5")));
        assert!(!c.matches(&v("1.3.0")));

        let c: VersionConstraint = "~> 1.2".parse().unwrap();
        assert!(c.matches(&v("1.9.0")));
        assert!(!c.matches(&v("2.0.0")));
    }

    #[test]
    fn any_constraint_renders_as_open_floor() {
        assert_eq!(VersionConstraint::Any.to_string(), ">= 0.0.0");
        assert!(VersionConstraint::Any.matches(&v("0.0")));
    }
}
