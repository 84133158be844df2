//! Galley run-list expansion.
//!
//! Takes a node's declared run list — an ordered sequence of role and recipe
//! references, optionally version-pinned — and produces the fully resolved,
//! deduplicated recipe order, merged default and override attribute trees,
//! and a diagnostic trace of which entry pulled in which. Role references
//! are resolved recursively through a pluggable [`RoleFetcher`] backend
//! (local role files or the server API); missing roles are aggregated, not
//! fatal.
//!
//! ```no_run
//! use galley_runlist::{DiskRoleFetcher, RunList};
//!
//! # async fn demo() -> galley_runlist::Result<()> {
//! let run_list = RunList::parse(["role[webserver]", "recipe[monitoring]"])?;
//! let fetcher = DiskRoleFetcher::new("/var/galley/roles");
//! let expansion = run_list.expand("production", &fetcher).await?;
//!
//! for (recipe, version) in expansion.recipes().with_versions() {
//!     println!("{recipe} {version:?}");
//! }
//! if expansion.has_errors() {
//!     eprintln!("missing roles: {:?}", expansion.errors());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod expansion;
pub mod fakes;
pub mod fetch;
pub mod item;
pub mod recipe_list;
pub mod role;
pub mod run_list;
pub mod telemetry;
pub mod version;

pub use error::{FetchError, Result, RunListError};
pub use expansion::{RunListExpansion, TOP_LEVEL};
pub use fetch::{ApiRoleFetcher, DiskRoleFetcher, FetchResult, RoleFetcher};
pub use item::{ItemKind, RunListItem};
pub use recipe_list::VersionedRecipeList;
pub use role::{RoleDefinition, DEFAULT_ENVIRONMENT};
pub use run_list::RunList;
pub use version::{ConstraintOp, CookbookVersion, VersionConstraint};
