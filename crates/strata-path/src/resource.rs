//! Embedded resources addressed with a leading `:` (`:/icons/app.png`).
//!
//! The resolver never touches the filesystem for these paths; it hands them
//! to a [`ResourceResolver`].

use std::collections::BTreeMap;

use crate::clean_path;

/// An embedded resource found by a [`ResourceResolver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Cleaned resource name, without the leading `:`
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Lookup for embedded resources
pub trait ResourceResolver {
    /// `path` is the resource name with the leading `:` already stripped.
    fn resolve_resource(&self, path: &str) -> Option<ResolvedResource>;
}

/// Resolves nothing; every resource lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceResolver for NoResources {
    fn resolve_resource(&self, _path: &str) -> Option<ResolvedResource> {
        None
    }
}

/// Resources compiled into the binary, keyed by absolute resource name.
///
/// Directories are implied by the names of the blobs below them.
#[derive(Debug, Clone, Default)]
pub struct StaticResources {
    blobs: BTreeMap<String, &'static [u8]>,
}

fn resource_key(path: &str) -> String {
    clean_path(&format!("/{path}"))
}

impl StaticResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: &'static [u8]) -> &mut Self {
        self.blobs.insert(resource_key(path), data);
        self
    }

    /// Contents of a file resource.
    pub fn open(&self, path: &str) -> Option<&'static [u8]> {
        self.blobs.get(&resource_key(path)).copied()
    }
}

impl ResourceResolver for StaticResources {
    fn resolve_resource(&self, path: &str) -> Option<ResolvedResource> {
        let key = resource_key(path);
        if let Some(data) = self.blobs.get(&key) {
            return Some(ResolvedResource {
                path: key,
                size: data.len() as u64,
                is_dir: false,
            });
        }

        let dir_prefix = if key == "/" {
            key.clone()
        } else {
            format!("{key}/")
        };
        self.blobs
            .keys()
            .any(|name| name.starts_with(&dir_prefix))
            .then(|| ResolvedResource {
                path: key,
                size: 0,
                is_dir: true,
            })
    }
}
