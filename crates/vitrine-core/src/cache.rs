//! The local key-value cache used as the offline fallback.
//!
//! Each content type owns one slot holding a serialized JSON array. Reads are
//! forgiving: anything that cannot be read is reported as absent, and the
//! reconciliation layer falls through to the hardcoded defaults.

use std::{
  collections::HashMap,
  fs,
  io::{self, Write as _},
  path::{Path, PathBuf},
  sync::{Mutex, PoisonError},
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache io error: {0}")]
  Io(#[from] io::Error),

  #[error("invalid cache key: {0:?}")]
  InvalidKey(String),
}

/// A synchronous key → string store scoped to this device.
pub trait LocalCache: Send + Sync {
  /// The stored value, or `None` if absent or unreadable.
  fn get(&self, key: &str) -> Option<String>;

  /// Overwrite the slot. Last write wins.
  fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

  fn remove(&self, key: &str) -> Result<(), CacheError>;
}

// ─── Memory ──────────────────────────────────────────────────────────────────

/// Process-lifetime cache; the equivalent of session storage.
#[derive(Debug, Default)]
pub struct MemoryCache {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }
}

impl LocalCache for MemoryCache {
  fn get(&self, key: &str) -> Option<String> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), CacheError> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(key);
    Ok(())
  }
}

// ─── File ────────────────────────────────────────────────────────────────────

/// One file per key under a directory; survives restarts.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// crash mid-write never leaves a half-written slot.
#[derive(Debug, Clone)]
pub struct FileCache {
  dir: PathBuf,
}

impl FileCache {
  /// Open (or create) a cache rooted at `dir`.
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(Self { dir })
  }

  fn path(&self, key: &str) -> Result<PathBuf, CacheError> {
    let valid = !key.is_empty()
      && !key.starts_with('.')
      && key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
      return Err(CacheError::InvalidKey(key.to_owned()));
    }
    Ok(self.dir.join(format!("{key}.json")))
  }
}

impl LocalCache for FileCache {
  fn get(&self, key: &str) -> Option<String> {
    let path = self.path(key).ok()?;
    match fs::read_to_string(&path) {
      Ok(s) => Some(s),
      Err(e) if e.kind() == io::ErrorKind::NotFound => None,
      Err(e) => {
        warn!(path = %path.display(), error = %e, "unreadable cache slot");
        None
      }
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
    let path = self.path(key)?;
    // Each write gets its own temp file; the rename replaces the slot whole.
    let mut file = NamedTempFile::new_in(&self.dir)?;
    file.write_all(value.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(&path).map_err(|e| e.error)?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), CacheError> {
    match fs::remove_file(self.path(key)?) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_cache_last_write_wins() {
    let cache = MemoryCache::new();
    assert_eq!(cache.get("k"), None);
    cache.set("k", "1").unwrap();
    cache.set("k", "2").unwrap();
    assert_eq!(cache.get("k").as_deref(), Some("2"));
    cache.remove("k").unwrap();
    assert_eq!(cache.get("k"), None);
  }

  #[test]
  fn file_cache_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    FileCache::open(dir.path())
      .unwrap()
      .set("vitrine.services", "[]")
      .unwrap();

    let reopened = FileCache::open(dir.path()).unwrap();
    assert_eq!(reopened.get("vitrine.services").as_deref(), Some("[]"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
  }

  #[test]
  fn concurrent_writes_to_one_slot_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::open(dir.path()).unwrap();
    let values: Vec<String> = (0..8).map(|n| format!("[{n}]")).collect();

    std::thread::scope(|scope| {
      for value in &values {
        let cache = &cache;
        scope.spawn(move || cache.set("vitrine.cases", value).unwrap());
      }
    });

    let stored = cache.get("vitrine.cases").unwrap();
    assert!(values.contains(&stored));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
  }

  #[test]
  fn file_cache_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::open(dir.path()).unwrap();

    assert!(matches!(
      cache.set("../escape", "x"),
      Err(CacheError::InvalidKey(_))
    ));
    assert_eq!(cache.get("../escape"), None);
  }

  #[test]
  fn removing_a_missing_file_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::open(dir.path()).unwrap();
    assert!(cache.remove("absent").is_ok());
  }
}
