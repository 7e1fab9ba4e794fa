use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// Errors that can occur while resolving a path
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A symlink substitution produced a path already seen in this call,
    /// or the substitution budget ran out.
    #[error("too many levels of symbolic links: {path}")]
    Cycle { path: String },

    /// A prefix could not be queried for a reason other than absence.
    /// Only reported under [`ErrorPolicy::Strict`](crate::ErrorPolicy::Strict).
    #[error("cannot resolve {path}: {source}")]
    Unresolvable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot read symbolic link {path}: {source}")]
    ReadLink {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("no such file or directory: {path}")]
    NotFound { path: String },

    #[error("invalid search path prefix: {prefix:?}")]
    InvalidPrefix { prefix: String },

    #[error("search path aliases nested too deeply: {path}")]
    AliasDepth { path: String },
}

impl ResolveError {
    /// The errno a file-access call should report for this failure.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ResolveError::Cycle { .. } | ResolveError::AliasDepth { .. } => {
                Some(Errno::ELOOP as i32)
            }
            ResolveError::NotFound { .. } => Some(Errno::ENOENT as i32),
            ResolveError::Unresolvable { source, .. } | ResolveError::ReadLink { source, .. } => {
                source.raw_os_error()
            }
            ResolveError::InvalidPrefix { .. } => Some(Errno::EINVAL as i32),
        }
    }

    /// Path the failure refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ResolveError::Cycle { path }
            | ResolveError::Unresolvable { path, .. }
            | ResolveError::ReadLink { path, .. }
            | ResolveError::NotFound { path }
            | ResolveError::AliasDepth { path } => Some(path),
            ResolveError::InvalidPrefix { .. } => None,
        }
    }
}

impl From<ResolveError> for io::Error {
    fn from(err: ResolveError) -> Self {
        match err.raw_os_error() {
            Some(code) => io::Error::new(io::Error::from_raw_os_error(code).kind(), err),
            None => io::Error::other(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

/// True for errors meaning "nothing is there", as opposed to "could not look".
pub(crate) fn is_absent(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }
    err.raw_os_error() == Some(Errno::ENOTDIR as i32)
}
