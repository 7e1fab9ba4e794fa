//! Filesystem access used by the resolver.
//!
//! The resolver only ever reads: stat, lstat and readlink.

use std::io;

use nix::sys::stat::{lstat, stat, SFlag};

use crate::PathMetadata;

/// Read-only filesystem queries needed for path resolution
pub trait FileSystem {
    /// Attributes of `path` itself. Link-ness is always known; for a link the
    /// stat attributes describe its target (or report it missing when dangling).
    fn symlink_metadata(&self, path: &str) -> io::Result<PathMetadata>;

    /// Attributes of whatever `path` ultimately points to.
    fn metadata(&self, path: &str) -> io::Result<PathMetadata>;

    /// Raw target of the symbolic link at `path`.
    fn read_link(&self, path: &str) -> io::Result<String>;

    /// Base for relative input paths.
    fn current_dir(&self) -> io::Result<String>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn symlink_metadata(&self, path: &str) -> io::Result<PathMetadata> {
        (**self).symlink_metadata(path)
    }

    fn metadata(&self, path: &str) -> io::Result<PathMetadata> {
        (**self).metadata(path)
    }

    fn read_link(&self, path: &str) -> io::Result<String> {
        (**self).read_link(path)
    }

    fn current_dir(&self) -> io::Result<String> {
        (**self).current_dir()
    }
}

/// The host operating system's filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

fn utf8(path: std::path::PathBuf) -> io::Result<String> {
    path.into_os_string().into_string().map_err(|raw| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("path is not valid UTF-8: {}", raw.to_string_lossy()),
        )
    })
}

impl FileSystem for OsFileSystem {
    fn symlink_metadata(&self, path: &str) -> io::Result<PathMetadata> {
        let st = lstat(path)?;
        let mut metadata = PathMetadata::new();

        let is_link = st.st_mode & SFlag::S_IFMT.bits() == SFlag::S_IFLNK.bits();
        metadata.set_link(is_link);

        if is_link {
            match stat(path) {
                Ok(target) => metadata.fill_from_stat(&target),
                // Dangling: the link exists, its target does not
                Err(_) => metadata.set_missing(),
            }
        } else {
            metadata.fill_from_stat(&st);
        }
        Ok(metadata)
    }

    fn metadata(&self, path: &str) -> io::Result<PathMetadata> {
        let st = stat(path)?;
        let mut metadata = PathMetadata::new();
        metadata.fill_from_stat(&st);
        Ok(metadata)
    }

    fn read_link(&self, path: &str) -> io::Result<String> {
        utf8(std::fs::read_link(path)?)
    }

    fn current_dir(&self) -> io::Result<String> {
        utf8(std::env::current_dir()?)
    }
}
