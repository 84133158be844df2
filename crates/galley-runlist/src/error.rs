//! Error taxonomy for run-list parsing and expansion.

use thiserror::Error;

/// Errors raised by a role-fetch backend.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend has no role by this name.
    ///
    /// The one recoverable condition during expansion: it is logged and
    /// aggregated on the expansion, never raised to the caller.
    #[error("role not found: {name}")]
    NotFound { name: String },

    /// HTTP-level failure other than a 404. Fatal; retry policy, if any,
    /// belongs to the transport layer.
    #[error("http error fetching role {name}: {message}")]
    Http { name: String, message: String },

    /// Disk read failure other than a missing file.
    #[error("io error reading role {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run-list domain errors.
#[derive(Debug, Error)]
pub enum RunListError {
    /// A string entry matching none of the accepted grammars, or a structured
    /// record missing its required fields.
    #[error("malformed run list item {item:?}: {reason}")]
    MalformedItem { item: String, reason: String },

    /// A version string that is neither a dotted numeric version nor an
    /// operator-prefixed constraint.
    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),

    /// The same recipe was pinned to two different versions.
    #[error("version conflict for recipe {recipe}: {existing} conflicts with {proposed}")]
    VersionConflict {
        recipe: String,
        existing: String,
        proposed: String,
    },

    /// A fetch-backend fault other than "role not found". Missing roles are
    /// aggregated on the expansion instead of surfacing here.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type for run-list operations.
pub type Result<T> = std::result::Result<T, RunListError>;
