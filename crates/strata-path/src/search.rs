use std::collections::BTreeMap;

use crate::{clean_path, ResolveError, Result};

/// Search paths for `prefix:` style aliases.
///
/// `icons:app/logo.png` is looked up in each directory registered for
/// `icons`, in order. Prefixes are at least two ASCII letters or digits;
/// a single letter followed by `:` reads like a drive letter and is never an
/// alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPathRegistry {
    entries: BTreeMap<String, Vec<String>>,
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < 2 || !prefix.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ResolveError::InvalidPrefix {
            prefix: prefix.to_string(),
        });
    }
    Ok(())
}

impl SearchPathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a prefix -> directories table.
    pub fn from_map<'a, I, P>(table: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, P)>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut registry = Self::new();
        for (prefix, paths) in table {
            registry.set_search_paths(prefix, paths)?;
        }
        Ok(registry)
    }

    /// Replace the search paths of `prefix`. An empty list removes it.
    pub fn set_search_paths<I>(&mut self, prefix: &str, paths: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        validate_prefix(prefix)?;
        let paths: Vec<String> = paths
            .into_iter()
            .map(|p| clean_path(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();

        if paths.is_empty() {
            self.entries.remove(prefix);
        } else {
            self.entries.insert(prefix.to_string(), paths);
        }
        Ok(())
    }

    /// Append one directory to the search paths of `prefix`.
    pub fn add_search_path(&mut self, prefix: &str, path: &str) -> Result<()> {
        validate_prefix(prefix)?;
        let path = clean_path(path);
        if path.is_empty() {
            return Ok(());
        }
        self.entries.entry(prefix.to_string()).or_default().push(path);
        Ok(())
    }

    /// Directories registered for `prefix`, in lookup order.
    pub fn search_paths(&self, prefix: &str) -> &[String] {
        self.entries
            .get(prefix)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn remove(&mut self, prefix: &str) -> Option<Vec<String>> {
        self.entries.remove(prefix)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
