//! Filesystem backend over the real disk with atomic file writes.

use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use tempfile::NamedTempFile;

use super::{EntryKind, EntryStat, FileSystem};

/// [`FileSystem`] backed by the host filesystem.
///
/// Writes go through a temporary file in the target directory that is
/// renamed into place, so a failed write leaves the previous state intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn is_file(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Utf8Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn write_file(&self, path: &Utf8Path, contents: &str) -> io::Result<()> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));

        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|err| err.error)?;
        Ok(())
    }

    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn remove_file(&self, path: &Utf8Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Utf8Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn stat(&self, path: &Utf8Path) -> io::Result<EntryStat> {
        let metadata = fs::metadata(path)?;
        let kind = if metadata.is_file() {
            EntryKind::File
        } else if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };
        Ok(EntryStat {
            kind,
            len: if metadata.is_dir() { 0 } else { metadata.len() },
        })
    }
}
