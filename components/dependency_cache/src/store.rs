//! Cache storage backends

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{CacheError, Result};

/// Key/value storage for response bodies, keyed by full URL
pub trait CacheStore: Send + Sync {
    /// Stored body for `url`
    fn get(&self, url: &str) -> Result<Option<String>>;

    /// Store `body` for `url`, replacing any previous entry
    fn set(&self, url: &str, body: &str) -> Result<()>;

    /// Remove every entry
    fn clear(&self) -> Result<()>;

    /// Number of stored entries
    fn count(&self) -> Result<usize>;
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, url: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(url).cloned())
    }

    fn set(&self, url: &str, body: &str) -> Result<()> {
        self.entries.lock().insert(url.to_string(), body.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.entries.lock().len())
    }
}

const ENTRY_EXTENSION: &str = "js";

/// Directory-backed store with one file per URL.
///
/// Files are named by the hex SHA-256 of the URL, so any URL maps to a
/// valid file name.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (and create if needed) a cache directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| CacheError::io(&dir, err))?;
        debug!(dir = %dir.display(), "opened dependency cache");
        Ok(DiskCache { dir })
    }

    /// The cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        let name: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
        self.dir.join(name).with_extension(ENTRY_EXTENSION)
    }

    fn entries(&self) -> Result<Vec<PathBuf>> {
        let read = fs::read_dir(&self.dir).map_err(|err| CacheError::io(&self.dir, err))?;
        let mut paths = Vec::new();
        for entry in read {
            let entry = entry.map_err(|err| CacheError::io(&self.dir, err))?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == ENTRY_EXTENSION) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl CacheStore for DiskCache {
    fn get(&self, url: &str) -> Result<Option<String>> {
        let path = self.entry_path(url);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CacheError::io(path, err)),
        }
    }

    fn set(&self, url: &str, body: &str) -> Result<()> {
        let path = self.entry_path(url);
        // Write then rename so readers never see a partial entry
        let partial = path.with_extension("partial");
        fs::write(&partial, body).map_err(|err| CacheError::io(&partial, err))?;
        fs::rename(&partial, &path).map_err(|err| CacheError::io(&path, err))?;
        debug!(url, path = %path.display(), "cached dependency");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for path in self.entries()? {
            fs::remove_file(&path).map_err(|err| CacheError::io(&path, err))?;
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }
}

/// `<user cache dir>/jsbench`, falling back to the system temp directory
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jsbench")
}
