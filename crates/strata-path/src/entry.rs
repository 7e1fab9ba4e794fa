use std::cell::OnceCell;
use std::fmt;

/// A path string with a lazily computed split between directory and file name.
///
/// The value is never edited in place; [`PathEntry::reassign`] replaces it
/// wholesale and drops the cached split.
#[derive(Clone, Default)]
pub struct PathEntry {
    file_path: String,
    /// Byte index of the last `/`, computed on first use
    last_separator: OnceCell<Option<usize>>,
}

impl PathEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
            last_separator: OnceCell::new(),
        }
    }

    /// Replace the whole entry with a new path.
    pub fn reassign(&mut self, path: impl Into<String>) {
        self.file_path = path.into();
        self.last_separator = OnceCell::new();
    }

    /// The full path as given.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    fn last_separator(&self) -> Option<usize> {
        *self
            .last_separator
            .get_or_init(|| self.file_path.rfind('/'))
    }

    /// Everything after the last separator.
    pub fn file_name(&self) -> &str {
        match self.last_separator() {
            Some(idx) => &self.file_path[idx + 1..],
            None => &self.file_path,
        }
    }

    /// The directory part: `"/"` for entries directly under the root, `"."`
    /// when there is no separator at all.
    pub fn path(&self) -> &str {
        match self.last_separator() {
            None => ".",
            Some(0) => "/",
            Some(idx) => &self.file_path[..idx],
        }
    }

    /// File name up to its first `.`
    pub fn base_name(&self) -> &str {
        let name = self.file_name();
        match name.find('.') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }

    /// File name after its last `.`, empty if there is none
    pub fn suffix(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) => &name[idx + 1..],
            None => "",
        }
    }

    /// File name after its first `.`, empty if there is none
    pub fn complete_suffix(&self) -> &str {
        let name = self.file_name();
        match name.find('.') {
            Some(idx) => &name[idx + 1..],
            None => "",
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.file_path.starts_with('/')
    }

    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    pub fn is_empty(&self) -> bool {
        self.file_path.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.file_path == "/"
    }

    pub fn into_string(self) -> String {
        self.file_path
    }
}

impl fmt::Debug for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathEntry").field(&self.file_path).finish()
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_path)
    }
}

impl PartialEq for PathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path
    }
}

impl Eq for PathEntry {}

impl AsRef<str> for PathEntry {
    fn as_ref(&self) -> &str {
        &self.file_path
    }
}

impl From<&str> for PathEntry {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for PathEntry {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
