//! Filesystem access used by the manager.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Whole-file operations on configuration files.
pub trait ConfigFs: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ConfigFs for LocalFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-process filesystem for tests and dry runs.
///
/// Counts writes and can be told to fail them, so callers can observe
/// whether (and how) the write path was reached.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<PathBuf, String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting it as a write.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files_mut().insert(path.into(), contents.into());
    }

    /// Current contents of a file.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files_mut().get(path).cloned()
    }

    /// All paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files_mut().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of `write` calls made so far (including failed ones).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `write` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn files_mut(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        // A panicking test thread must not hide the files from the others.
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ConfigFs for MemoryFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.contents(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"));
        }
        self.insert(path, contents);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let contents = self.read_to_string(from)?;
        self.insert(to, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files_mut().contains_key(path)
    }
}
