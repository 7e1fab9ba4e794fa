//! # strata-path
//!
//! Path resolution for Strata.
//!
//! Turns a path string into its canonical absolute form: no symbolic links,
//! no `.`/`..` segments, no repeated separators. Symlink cycles are detected
//! and reported instead of looping.
//!
//! Besides plain filesystem paths, two virtual namespaces are recognized:
//!
//! ```text
//! icons:app/logo.png     # search-path alias, expanded through SearchPathRegistry
//! :/builtin/logo.png     # embedded resource, delegated to a ResourceResolver
//! ```
//!
//! Filesystem access goes through the [`FileSystem`] trait so the resolver can
//! run against the real OS ([`OsFileSystem`]) or any other backend.

mod clean;
mod entry;
mod error;
mod fs;
mod metadata;
mod resolver;
mod resource;
mod search;

pub use clean::clean_path;
pub use entry::PathEntry;
pub use error::{ResolveError, Result};
pub use fs::{FileSystem, OsFileSystem};
pub use metadata::{MetaFlags, PathMetadata};
pub use resolver::{
    ErrorPolicy, PathResolver, Resolved, DEFAULT_MAX_ALIAS_DEPTH, DEFAULT_MAX_SUBSTITUTIONS,
};
pub use resource::{NoResources, ResolvedResource, ResourceResolver, StaticResources};
pub use search::SearchPathRegistry;
