//! In-memory filesystem for tests, with injectable write failures.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};

use super::{EntryKind, EntryStat, FileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    File(String),
    Directory,
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<Utf8PathBuf, Entry>,
    failing_writes: BTreeSet<Utf8PathBuf>,
}

/// In-memory [`FileSystem`] for tests.
///
/// The filesystem root always exists. Writes to paths registered with
/// [`MemoryFileSystem::fail_writes_to`] return `PermissionDenied`.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory and its parents.
    #[must_use]
    pub fn with_directory(self, path: impl AsRef<Utf8Path>) -> Self {
        drop(self.create_dir_all(path.as_ref()));
        self
    }

    /// Adds a file, creating its parents.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Utf8Path>, contents: impl Into<String>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            drop(self.create_dir_all(parent));
        }
        self.lock()
            .entries
            .insert(path.to_path_buf(), Entry::File(contents.into()));
        self
    }

    /// Makes every later write to `path` fail.
    pub fn fail_writes_to(&self, path: impl AsRef<Utf8Path>) {
        self.lock()
            .failing_writes
            .insert(path.as_ref().to_path_buf());
    }

    /// Returns the contents of the file at `path`.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Utf8Path>) -> Option<String> {
        match self.lock().entries.get(path.as_ref()) {
            Some(Entry::File(contents)) => Some(contents.clone()),
            _ => None,
        }
    }

    /// Returns every file path, sorted.
    #[must_use]
    pub fn files(&self) -> Vec<Utf8PathBuf> {
        self.lock()
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn entry_kind(&self, path: &Utf8Path) -> Option<EntryKind> {
        if path.parent().is_none() {
            return Some(EntryKind::Directory);
        }
        self.lock().entries.get(path).map(|entry| match entry {
            Entry::File(_) => EntryKind::File,
            Entry::Directory => EntryKind::Directory,
        })
    }
}

fn not_found(path: &Utf8Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{path} does not exist"))
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        self.entry_kind(path).is_some()
    }

    fn is_file(&self, path: &Utf8Path) -> bool {
        self.entry_kind(path) == Some(EntryKind::File)
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        self.entry_kind(path) == Some(EntryKind::Directory)
    }

    fn create_dir_all(&self, path: &Utf8Path) -> io::Result<()> {
        let mut state = self.lock();
        let mut ancestors: Vec<&Utf8Path> = path
            .ancestors()
            .filter(|ancestor| ancestor.parent().is_some())
            .collect();
        ancestors.reverse();

        for ancestor in ancestors {
            match state.entries.get(ancestor) {
                Some(Entry::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("{ancestor} is a file"),
                    ));
                }
                Some(Entry::Directory) => {}
                None => {
                    state
                        .entries
                        .insert(ancestor.to_path_buf(), Entry::Directory);
                }
            }
        }
        Ok(())
    }

    fn write_file(&self, path: &Utf8Path, contents: &str) -> io::Result<()> {
        if self.is_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{path} is a directory"),
            ));
        }
        let parent_is_dir = path.parent().is_some_and(|parent| self.is_dir(parent));
        if !parent_is_dir {
            return Err(not_found(path));
        }

        let mut state = self.lock();
        if state.failing_writes.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("writes to {path} are disabled"),
            ));
        }
        state
            .entries
            .insert(path.to_path_buf(), Entry::File(contents.to_owned()));
        Ok(())
    }

    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    fn remove_file(&self, path: &Utf8Path) -> io::Result<()> {
        let mut state = self.lock();
        match state.entries.get(path) {
            Some(Entry::File(_)) => {
                state.entries.remove(path);
                Ok(())
            }
            Some(Entry::Directory) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{path} is a directory"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Utf8Path) -> io::Result<()> {
        let mut state = self.lock();
        match state.entries.get(path) {
            Some(Entry::Directory) => {
                state
                    .entries
                    .retain(|candidate, _| !candidate.starts_with(path));
                Ok(())
            }
            Some(Entry::File(_)) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{path} is a file"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn stat(&self, path: &Utf8Path) -> io::Result<EntryStat> {
        if path.parent().is_none() {
            return Ok(EntryStat {
                kind: EntryKind::Directory,
                len: 0,
            });
        }
        match self.lock().entries.get(path) {
            Some(Entry::File(contents)) => Ok(EntryStat {
                kind: EntryKind::File,
                len: u64::try_from(contents.len()).unwrap_or(u64::MAX),
            }),
            Some(Entry::Directory) => Ok(EntryStat {
                kind: EntryKind::Directory,
                len: 0,
            }),
            None => Err(not_found(path)),
        }
    }
}
