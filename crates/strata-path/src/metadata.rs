//! Stat-like attributes with a "known" mask.
//!
//! Attributes are filled on demand. Each value is only meaningful when its
//! flag is in the known mask; reads of unknown attributes return `None`.

use std::fs::FileType;

use bitflags::bitflags;
use nix::sys::stat::{FileStat, Mode, SFlag};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MetaFlags: u32 {
        const OWNER_READ = 1 << 0;
        const OWNER_WRITE = 1 << 1;
        const OWNER_EXECUTE = 1 << 2;
        const GROUP_READ = 1 << 3;
        const GROUP_WRITE = 1 << 4;
        const GROUP_EXECUTE = 1 << 5;
        const OTHER_READ = 1 << 6;
        const OTHER_WRITE = 1 << 7;
        const OTHER_EXECUTE = 1 << 8;

        const LINK_TYPE = 1 << 16;
        const FILE_TYPE = 1 << 17;
        const DIRECTORY_TYPE = 1 << 18;
        const SEQUENTIAL_TYPE = 1 << 19;

        const EXISTS = 1 << 20;

        const SIZE = 1 << 24;
        const TIMES = 1 << 25;
        const USER_ID = 1 << 26;
        const GROUP_ID = 1 << 27;

        const PERMISSIONS = Self::OWNER_READ.bits()
            | Self::OWNER_WRITE.bits()
            | Self::OWNER_EXECUTE.bits()
            | Self::GROUP_READ.bits()
            | Self::GROUP_WRITE.bits()
            | Self::GROUP_EXECUTE.bits()
            | Self::OTHER_READ.bits()
            | Self::OTHER_WRITE.bits()
            | Self::OTHER_EXECUTE.bits();

        const TYPES = Self::LINK_TYPE.bits()
            | Self::FILE_TYPE.bits()
            | Self::DIRECTORY_TYPE.bits()
            | Self::SEQUENTIAL_TYPE.bits();

        /// Everything a single stat call answers (link-ness needs lstat)
        const POSIX_STAT = Self::PERMISSIONS.bits()
            | Self::FILE_TYPE.bits()
            | Self::DIRECTORY_TYPE.bits()
            | Self::SEQUENTIAL_TYPE.bits()
            | Self::EXISTS.bits()
            | Self::SIZE.bits()
            | Self::TIMES.bits()
            | Self::USER_ID.bits()
            | Self::GROUP_ID.bits();
    }
}

const PERMISSION_BITS: [(Mode, MetaFlags); 9] = [
    (Mode::S_IRUSR, MetaFlags::OWNER_READ),
    (Mode::S_IWUSR, MetaFlags::OWNER_WRITE),
    (Mode::S_IXUSR, MetaFlags::OWNER_EXECUTE),
    (Mode::S_IRGRP, MetaFlags::GROUP_READ),
    (Mode::S_IWGRP, MetaFlags::GROUP_WRITE),
    (Mode::S_IXGRP, MetaFlags::GROUP_EXECUTE),
    (Mode::S_IROTH, MetaFlags::OTHER_READ),
    (Mode::S_IWOTH, MetaFlags::OTHER_WRITE),
    (Mode::S_IXOTH, MetaFlags::OTHER_EXECUTE),
];

/// Cached attributes of one filesystem entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMetadata {
    known: MetaFlags,
    entry: MetaFlags,
    size: u64,
    created: i64,
    modified: i64,
    accessed: i64,
    uid: u32,
    gid: u32,
}

impl PathMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags whose values are known
    pub fn known_flags(&self) -> MetaFlags {
        self.known
    }

    /// True when every flag in `mask` is known.
    pub fn has_flags(&self, mask: MetaFlags) -> bool {
        self.known.contains(mask)
    }

    /// Value of a single flag, `None` while unknown.
    pub fn flag(&self, flag: MetaFlags) -> Option<bool> {
        self.has_flags(flag).then(|| self.entry.contains(flag))
    }

    fn known_and_set(&self, flag: MetaFlags) -> bool {
        self.flag(flag).unwrap_or(false)
    }

    pub fn exists(&self) -> bool {
        self.known_and_set(MetaFlags::EXISTS)
    }

    pub fn is_symlink(&self) -> bool {
        self.known_and_set(MetaFlags::LINK_TYPE)
    }

    pub fn is_dir(&self) -> bool {
        self.known_and_set(MetaFlags::DIRECTORY_TYPE)
    }

    pub fn is_file(&self) -> bool {
        self.known_and_set(MetaFlags::FILE_TYPE)
    }

    pub fn is_sequential(&self) -> bool {
        self.known_and_set(MetaFlags::SEQUENTIAL_TYPE)
    }

    /// Known permission bits that are set
    pub fn permissions(&self) -> Option<MetaFlags> {
        self.has_flags(MetaFlags::PERMISSIONS)
            .then(|| self.entry & MetaFlags::PERMISSIONS)
    }

    pub fn size(&self) -> Option<u64> {
        self.has_flags(MetaFlags::SIZE).then_some(self.size)
    }

    /// Status-change time, or mtime when the platform reports none (seconds)
    pub fn created(&self) -> Option<i64> {
        self.has_flags(MetaFlags::TIMES).then_some(self.created)
    }

    pub fn modified(&self) -> Option<i64> {
        self.has_flags(MetaFlags::TIMES).then_some(self.modified)
    }

    pub fn accessed(&self) -> Option<i64> {
        self.has_flags(MetaFlags::TIMES).then_some(self.accessed)
    }

    pub fn user_id(&self) -> Option<u32> {
        self.has_flags(MetaFlags::USER_ID).then_some(self.uid)
    }

    pub fn group_id(&self) -> Option<u32> {
        self.has_flags(MetaFlags::GROUP_ID).then_some(self.gid)
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record whether the entry itself is a symbolic link.
    pub fn set_link(&mut self, is_link: bool) {
        self.known |= MetaFlags::LINK_TYPE;
        self.entry.set(MetaFlags::LINK_TYPE, is_link);
    }

    /// Record that a stat found nothing at this path.
    pub fn set_missing(&mut self) {
        self.entry.remove(MetaFlags::POSIX_STAT);
        self.known |= MetaFlags::POSIX_STAT;
    }

    /// Populate every stat-derived attribute from a stat buffer.
    pub fn fill_from_stat(&mut self, st: &FileStat) {
        self.entry.remove(MetaFlags::POSIX_STAT);
        self.known |= MetaFlags::POSIX_STAT;

        for (mode, flag) in PERMISSION_BITS {
            if st.st_mode & mode.bits() != 0 {
                self.entry |= flag;
            }
        }

        let kind = st.st_mode & SFlag::S_IFMT.bits();
        if kind == SFlag::S_IFREG.bits() {
            self.entry |= MetaFlags::FILE_TYPE;
        } else if kind == SFlag::S_IFDIR.bits() {
            self.entry |= MetaFlags::DIRECTORY_TYPE;
        } else {
            self.entry |= MetaFlags::SEQUENTIAL_TYPE;
        }

        self.entry |= MetaFlags::EXISTS;
        self.size = st.st_size.max(0) as u64;

        let ctime = st.st_ctime as i64;
        let mtime = st.st_mtime as i64;
        self.created = if ctime != 0 { ctime } else { mtime };
        self.modified = mtime;
        self.accessed = st.st_atime as i64;
        self.uid = st.st_uid as u32;
        self.gid = st.st_gid as u32;
    }

    /// Populate what a directory listing already tells us about an entry.
    ///
    /// Replaces the current state: a directory entry is a fresh observation.
    pub fn fill_from_dir_entry(&mut self, file_type: FileType) {
        let listed = MetaFlags::TYPES | MetaFlags::EXISTS;
        if file_type.is_symlink() {
            self.known = MetaFlags::LINK_TYPE;
            self.entry = MetaFlags::LINK_TYPE;
        } else if file_type.is_dir() {
            self.known = listed;
            self.entry = MetaFlags::DIRECTORY_TYPE | MetaFlags::EXISTS;
        } else if file_type.is_file() {
            self.known = listed;
            self.entry = MetaFlags::FILE_TYPE | MetaFlags::EXISTS;
        } else {
            self.known = listed;
            self.entry = MetaFlags::SEQUENTIAL_TYPE | MetaFlags::EXISTS;
        }
    }

    /// Take every attribute `other` knows. The known mask only grows.
    pub fn merge(&mut self, other: &PathMetadata) {
        self.entry = (self.entry & !other.known) | (other.entry & other.known);
        self.known |= other.known;

        if other.has_flags(MetaFlags::SIZE) {
            self.size = other.size;
        }
        if other.has_flags(MetaFlags::TIMES) {
            self.created = other.created;
            self.modified = other.modified;
            self.accessed = other.accessed;
        }
        if other.has_flags(MetaFlags::USER_ID) {
            self.uid = other.uid;
        }
        if other.has_flags(MetaFlags::GROUP_ID) {
            self.gid = other.gid;
        }
    }
}
