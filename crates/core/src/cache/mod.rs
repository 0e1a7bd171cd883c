//! File cache facade shared by the managers.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::{FileCacheConfig, Result};

/// Contents of a file read through a [`FileCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl CachedFile {
    pub fn new(path: PathBuf, bytes: Vec<u8>) -> Self {
        Self { path, bytes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Point-in-time hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cached access to file contents.
pub trait FileCache: Send + Sync + fmt::Debug {
    /// Returns the cached contents of `path`, reading the file on a miss.
    fn open(&self, path: &Path) -> Result<Arc<CachedFile>>;

    /// Drops the cached entry for `path`. Returns whether one existed.
    fn evict(&self, path: &Path) -> bool;

    /// Drops every cached entry.
    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;
}

/// Default cache backed by the local filesystem.
///
/// Entries stay resident until evicted; handles already given out keep their
/// contents alive after eviction.
#[derive(Debug, Default)]
pub struct LocalFileCache {
    root: Option<PathBuf>,
    entries: Mutex<HashMap<PathBuf, Arc<CachedFile>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LocalFileCache {
    pub fn new(config: &FileCacheConfig) -> Self {
        Self {
            root: config.root.clone(),
            ..Self::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileCache for LocalFileCache {
    fn open(&self, path: &Path) -> Result<Arc<CachedFile>> {
        let resolved = self.resolve(path);
        if let Some(entry) = self.entries.lock().get(&resolved) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(entry));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        // Read outside the lock; a concurrent reader of the same file may
        // race us, in which case the first inserted entry wins.
        let bytes = std::fs::read(&resolved)?;
        trace!(path = %resolved.display(), size = bytes.len(), "cached file");

        let mut entries = self.entries.lock();
        let entry = entries
            .entry(resolved.clone())
            .or_insert_with(|| Arc::new(CachedFile::new(resolved, bytes)));
        Ok(Arc::clone(entry))
    }

    fn evict(&self, path: &Path) -> bool {
        let resolved = self.resolve(path);
        self.entries.lock().remove(&resolved).is_some()
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileHandlerError;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "file-handler-cache-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn second_open_is_a_hit() {
        let dir = scratch_dir("hit");
        std::fs::write(dir.join("Init.bnk"), b"BKHD").unwrap();
        let cache = LocalFileCache::new(&FileCacheConfig {
            root: Some(dir.clone()),
        });

        let first = cache.open(Path::new("Init.bnk")).unwrap();
        let second = cache.open(Path::new("Init.bnk")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.bytes(), b"BKHD");
        assert_eq!(first.path(), dir.join("Init.bnk"));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn evicted_handles_stay_readable() {
        let dir = scratch_dir("evict");
        let path = dir.join("Music.bnk");
        std::fs::write(&path, b"music").unwrap();
        let cache = LocalFileCache::default();

        let handle = cache.open(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.evict(&path));
        assert!(!cache.evict(&path));
        assert!(cache.is_empty());
        assert_eq!(handle.len(), 5);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let cache = LocalFileCache::default();
        let err = cache
            .open(Path::new("/definitely/not/here.bnk"))
            .unwrap_err();
        assert!(matches!(err, FileHandlerError::Io(_)));
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.is_empty());
    }
}
