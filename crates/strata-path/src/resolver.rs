//! Symlink canonicalization and alias resolution.
//!
//! ## Canonicalization
//!
//! The path is walked prefix by prefix (`/a`, `/a/b`, `/a/b/c`, ...). When a
//! prefix turns out to be a symbolic link, the link target and the remainder
//! of the path are joined, cleaned, and the walk restarts from the top of the
//! new string. Every string produced this way is remembered; producing one
//! twice is a cycle. Prefixes already known to be plain entries are not
//! queried again within the same call.
//!
//! ## Aliases
//!
//! `prefix:rest` is tried against each search path of `prefix`; the first
//! candidate that exists wins. A bare leading `:` is an embedded resource.

use std::collections::HashSet;
use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::error::is_absent;
use crate::{
    clean_path, FileSystem, NoResources, OsFileSystem, PathEntry, PathMetadata, ResolveError,
    ResolvedResource, ResourceResolver, Result, SearchPathRegistry,
};

/// Symlinks followed per call before giving up with ELOOP (Linux MAXSYMLINKS)
pub const DEFAULT_MAX_SUBSTITUTIONS: usize = 40;

/// Nesting limit for aliases whose search paths are themselves aliases
pub const DEFAULT_MAX_ALIAS_DEPTH: usize = 16;

/// What to do when querying a path prefix fails for a reason other than
/// "does not exist".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Treat the prefix as a plain entry and keep going.
    #[default]
    Lenient,
    /// Abort with [`ResolveError::Unresolvable`].
    Strict,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(ErrorPolicy::Lenient),
            "strict" => Ok(ErrorPolicy::Strict),
            other => Err(format!("unknown error policy: {other}")),
        }
    }
}

/// Outcome of [`PathResolver::resolve_entry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File {
        entry: PathEntry,
        metadata: PathMetadata,
    },
    Resource(ResolvedResource),
}

enum PathKind<'a> {
    Resource(&'a str),
    Alias { prefix: &'a str, rest: &'a str },
    Plain,
}

/// Classify by what comes before the first `/`.
fn classify(path: &str) -> PathKind<'_> {
    for (idx, byte) in path.bytes().enumerate() {
        match byte {
            b'/' => break,
            b':' if idx == 0 => return PathKind::Resource(&path[1..]),
            // Drive letter, not an alias
            b':' if idx == 1 => break,
            b':' => {
                return PathKind::Alias {
                    prefix: &path[..idx],
                    rest: &path[idx + 1..],
                }
            }
            _ => {}
        }
    }
    PathKind::Plain
}

enum Probe {
    Plain,
    Link { target_is_dir: bool },
}

/// Working set of one canonicalization call
struct Walk {
    working: String,
    /// Where the search for the next separator starts
    cursor: usize,
    visited: HashSet<String>,
    known_plain: HashSet<String>,
    substitutions: usize,
}

impl Walk {
    fn new(start: String) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start.clone());
        Self {
            working: start,
            cursor: 1,
            visited,
            known_plain: HashSet::new(),
            substitutions: 0,
        }
    }

    fn next_separator(&self) -> Option<usize> {
        self.working
            .get(self.cursor..)
            .and_then(|tail| tail.find('/'))
            .map(|idx| idx + self.cursor)
    }
}

/// Canonicalizes paths against a [`FileSystem`]
pub struct PathResolver<F = OsFileSystem> {
    fs: F,
    search_paths: SearchPathRegistry,
    resources: Box<dyn ResourceResolver>,
    policy: ErrorPolicy,
    max_substitutions: usize,
    max_alias_depth: usize,
}

impl Default for PathResolver<OsFileSystem> {
    fn default() -> Self {
        Self::new(OsFileSystem)
    }
}

impl<F: FileSystem> PathResolver<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            search_paths: SearchPathRegistry::new(),
            resources: Box::new(NoResources),
            policy: ErrorPolicy::default(),
            max_substitutions: DEFAULT_MAX_SUBSTITUTIONS,
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
        }
    }

    pub fn with_search_paths(mut self, search_paths: SearchPathRegistry) -> Self {
        self.search_paths = search_paths;
        self
    }

    pub fn with_resources(mut self, resources: impl ResourceResolver + 'static) -> Self {
        self.resources = Box::new(resources);
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_substitutions(mut self, max: usize) -> Self {
        self.max_substitutions = max;
        self
    }

    pub fn with_max_alias_depth(mut self, max: usize) -> Self {
        self.max_alias_depth = max;
        self
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    pub fn search_paths(&self) -> &SearchPathRegistry {
        &self.search_paths
    }

    pub fn search_paths_mut(&mut self) -> &mut SearchPathRegistry {
        &mut self.search_paths
    }

    /// Resolve every symbolic link in `path` and drop redundant segments.
    ///
    /// Relative paths are taken relative to the filesystem's current
    /// directory. Components that do not exist are kept as written. An empty
    /// path yields an empty string.
    #[instrument(level = "debug", skip(self), fields(component = "RESOLVE"))]
    pub fn canonicalize(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Ok(String::new());
        }

        let start = if path.starts_with('/') {
            path.to_string()
        } else {
            let cwd = self
                .fs
                .current_dir()
                .map_err(|source| ResolveError::Unresolvable {
                    path: path.to_string(),
                    source,
                })?;
            format!("{cwd}/{path}")
        };

        let mut walk = Walk::new(start);
        loop {
            let separator = walk.next_separator();
            let prefix_end = separator.unwrap_or(walk.working.len());
            let prefix = &walk.working[..prefix_end];

            if !walk.known_plain.contains(prefix) {
                match self.probe(prefix)? {
                    Probe::Link { target_is_dir } => {
                        if let Some(next) = self.substitute(&walk, prefix, separator, target_is_dir)? {
                            walk.substitutions += 1;
                            if walk.substitutions > self.max_substitutions {
                                debug!(
                                    component = "RESOLVE",
                                    path,
                                    at = %next,
                                    limit = self.max_substitutions,
                                    "symlink substitution limit reached"
                                );
                                return Err(ResolveError::Cycle {
                                    path: path.to_string(),
                                });
                            }
                            if !walk.visited.insert(next.clone()) {
                                debug!(component = "RESOLVE", path, at = %next, "symlink cycle");
                                return Err(ResolveError::Cycle {
                                    path: path.to_string(),
                                });
                            }
                            trace!(component = "RESOLVE", from = %walk.working, to = %next, "substituted");
                            walk.working = next;
                            walk.cursor = 1;
                            continue;
                        }
                        walk.known_plain.insert(prefix.to_string());
                    }
                    Probe::Plain => {
                        walk.known_plain.insert(prefix.to_string());
                    }
                }
            }

            match separator {
                Some(idx) => walk.cursor = idx + 1,
                None => break,
            }
        }

        Ok(clean_path(&walk.working))
    }

    /// Build the string that replaces `walk.working` once `prefix` is found
    /// to be a link. `None` means the link could not be read and the prefix is
    /// treated as a plain entry.
    fn substitute(
        &self,
        walk: &Walk,
        prefix: &str,
        separator: Option<usize>,
        target_is_dir: bool,
    ) -> Result<Option<String>> {
        let target = match self.fs.read_link(prefix) {
            Ok(target) => target,
            Err(source) => {
                return match self.policy {
                    ErrorPolicy::Strict => Err(ResolveError::ReadLink {
                        path: prefix.to_string(),
                        source,
                    }),
                    ErrorPolicy::Lenient => {
                        warn!(component = "RESOLVE", prefix, error = %source, "readlink failed, treating as plain entry");
                        Ok(None)
                    }
                };
            }
        };

        let mut next = if target.starts_with('/') {
            target
        } else {
            let containing = PathEntry::new(prefix);
            format!("{}/{}", containing.path(), target)
        };

        if let Some(idx) = separator {
            if target_is_dir && !next.ends_with('/') {
                next.push('/');
            }
            next.push_str(&walk.working[idx..]);
        }

        Ok(Some(clean_path(&next)))
    }

    fn probe(&self, prefix: &str) -> Result<Probe> {
        match self.fs.symlink_metadata(prefix) {
            Ok(metadata) if metadata.is_symlink() => Ok(Probe::Link {
                target_is_dir: metadata.is_dir(),
            }),
            Ok(_) => Ok(Probe::Plain),
            Err(err) if is_absent(&err) => Ok(Probe::Plain),
            Err(source) => self.absorb(prefix, source).map(|()| Probe::Plain),
        }
    }

    /// Apply the error policy to a failed query.
    fn absorb(&self, path: &str, source: io::Error) -> Result<()> {
        match self.policy {
            ErrorPolicy::Lenient => {
                debug!(component = "RESOLVE", path, error = %source, "query failed, continuing");
                Ok(())
            }
            ErrorPolicy::Strict => Err(ResolveError::Unresolvable {
                path: path.to_string(),
                source,
            }),
        }
    }

    /// Expand aliases and embedded-resource paths.
    ///
    /// A plain path comes back unchanged without touching the filesystem.
    /// Alias candidates must exist; the first existing one is returned with
    /// its metadata filled.
    #[instrument(level = "debug", skip(self), fields(component = "RESOLVE"))]
    pub fn resolve_entry(&self, entry: &PathEntry) -> Result<Resolved> {
        self.resolve_entry_at(entry, 0, false)
    }

    fn resolve_entry_at(&self, entry: &PathEntry, depth: usize, must_exist: bool) -> Result<Resolved> {
        let path = entry.file_path();
        match classify(path) {
            PathKind::Resource(name) => self
                .resources
                .resolve_resource(name)
                .map(Resolved::Resource)
                .ok_or_else(|| ResolveError::NotFound {
                    path: path.to_string(),
                }),
            PathKind::Alias { prefix, rest } => {
                if depth >= self.max_alias_depth {
                    return Err(ResolveError::AliasDepth {
                        path: path.to_string(),
                    });
                }
                for base in self.search_paths.search_paths(prefix) {
                    let candidate = PathEntry::new(clean_path(&format!("{base}/{rest}")));
                    trace!(component = "RESOLVE", alias = prefix, candidate = %candidate, "trying search path");
                    match self.resolve_entry_at(&candidate, depth + 1, true) {
                        Ok(resolved) => return Ok(resolved),
                        Err(ResolveError::NotFound { .. }) => continue,
                        Err(err) => return Err(err),
                    }
                }
                Err(ResolveError::NotFound {
                    path: path.to_string(),
                })
            }
            PathKind::Plain if !must_exist => Ok(Resolved::File {
                entry: entry.clone(),
                metadata: PathMetadata::new(),
            }),
            PathKind::Plain => {
                let not_found = || ResolveError::NotFound {
                    path: path.to_string(),
                };
                match self.fs.metadata(path) {
                    Ok(metadata) if metadata.exists() => Ok(Resolved::File {
                        entry: entry.clone(),
                        metadata,
                    }),
                    Ok(_) => Err(not_found()),
                    Err(err) if is_absent(&err) => Err(not_found()),
                    Err(source) => {
                        self.absorb(path, source)?;
                        Err(not_found())
                    }
                }
            }
        }
    }

    /// Expand aliases, then canonicalize the resulting filesystem path.
    ///
    /// Embedded resources are returned as `:name` without canonicalization.
    pub fn canonical_path(&self, path: &str) -> Result<String> {
        match self.resolve_entry(&PathEntry::new(path))? {
            Resolved::File { entry, .. } => self.canonicalize(entry.file_path()),
            Resolved::Resource(resource) => Ok(format!(":{}", resource.path)),
        }
    }
}
