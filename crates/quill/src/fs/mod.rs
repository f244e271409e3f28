//! Filesystem seam for the executor.
//!
//! [`FileSystem`] is the only way the executor touches disk. The production
//! implementation is [`OsFileSystem`]; tests use the in-memory fake.

#[cfg(any(test, feature = "test-support"))]
mod memory;
mod os;

use std::io;

use camino::Utf8Path;

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Anything else, such as a device node.
    Other,
}

/// Subset of metadata the executor relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    /// Entry kind.
    pub kind: EntryKind,
    /// Size in bytes; zero for directories.
    pub len: u64,
}

/// Filesystem operations required to execute directives.
///
/// Paths are absolute and already validated by the caller.
pub trait FileSystem: Send + Sync {
    /// Returns whether anything exists at `path`.
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Returns whether `path` is a regular file.
    fn is_file(&self, path: &Utf8Path) -> bool;

    /// Returns whether `path` is a directory.
    fn is_dir(&self, path: &Utf8Path) -> bool;

    /// Creates `path` and every missing parent.
    ///
    /// # Errors
    /// Fails if a component exists and is not a directory.
    fn create_dir_all(&self, path: &Utf8Path) -> io::Result<()>;

    /// Replaces the contents of `path` with `contents`.
    ///
    /// Implementations must not leave a partially written file behind.
    ///
    /// # Errors
    /// Fails if the parent directory is missing or the write fails.
    fn write_file(&self, path: &Utf8Path, contents: &str) -> io::Result<()>;

    /// Reads `path` as UTF-8.
    ///
    /// # Errors
    /// Fails if the file is missing or not UTF-8.
    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String>;

    /// Removes the regular file at `path`.
    ///
    /// # Errors
    /// Fails if `path` is missing or is a directory.
    fn remove_file(&self, path: &Utf8Path) -> io::Result<()>;

    /// Removes the directory at `path` and everything beneath it.
    ///
    /// # Errors
    /// Fails if `path` is missing or is not a directory.
    fn remove_dir_all(&self, path: &Utf8Path) -> io::Result<()>;

    /// Returns metadata for `path`.
    ///
    /// # Errors
    /// Fails if `path` does not exist.
    fn stat(&self, path: &Utf8Path) -> io::Result<EntryStat>;
}
