//! Local fallback cache of report pointers.
//!
//! Persisted as a small key-value file: a JSON object whose
//! `forensicReports` key holds the entries, newest first. The cache is
//! bounded; once `capacity` is reached the oldest pointers are dropped.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::models::CacheEntry;

/// Storage key the entries live under.
pub const STORAGE_KEY: &str = "forensicReports";

/// Default number of pointers kept.
pub const DEFAULT_CAPACITY: usize = 500;

/// Errors raised while persisting the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Default)]
struct CacheState {
    /// Hashes, newest first.
    order: VecDeque<String>,
    entries: HashMap<String, CacheEntry>,
}

impl CacheState {
    fn from_entries(entries: Vec<CacheEntry>, capacity: usize) -> Self {
        let mut state = Self::default();
        for entry in entries {
            if state.order.len() >= capacity {
                break;
            }
            if state.entries.contains_key(&entry.hash) {
                continue;
            }
            state.order.push_back(entry.hash.clone());
            state.entries.insert(entry.hash.clone(), entry);
        }
        state
    }

    fn snapshot(&self) -> Vec<CacheEntry> {
        self.order
            .iter()
            .filter_map(|hash| self.entries.get(hash).cloned())
            .collect()
    }
}

/// Bounded mapping from image hash to its fallback pointer.
pub struct ReportCache {
    path: Option<PathBuf>,
    capacity: usize,
    state: RwLock<CacheState>,
}

impl ReportCache {
    /// Open a file-backed cache. Missing or unreadable files yield an empty cache.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let capacity = capacity.max(1);
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable report cache at {}: {}",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };
        tracing::debug!(
            "Loaded {} cached report pointers from {}",
            entries.len(),
            path.display()
        );

        Self {
            path: Some(path),
            capacity,
            state: RwLock::new(CacheState::from_entries(entries, capacity)),
        }
    }

    /// Create a cache that lives only in memory.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            path: None,
            capacity: capacity.max(1),
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up the pointer for a hash.
    pub fn find(&self, hash: &str) -> Option<CacheEntry> {
        self.read().entries.get(hash).cloned()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.read().entries.contains_key(hash)
    }

    /// All pointers, newest first.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.read().snapshot()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a pointer unless its hash is already cached.
    ///
    /// Returns `Ok(false)` without touching anything when the hash is present.
    /// New entries go to the front; entries beyond capacity are dropped from
    /// the back. The in-memory state only changes once the file is written,
    /// so a failed write leaves the cache as it was.
    pub fn record(&self, entry: CacheEntry) -> Result<bool, CacheError> {
        let mut state = self.write();
        if state.entries.contains_key(&entry.hash) {
            return Ok(false);
        }

        let mut next = state.clone();
        next.order.push_front(entry.hash.clone());
        next.entries.insert(entry.hash.clone(), entry);
        let mut evicted = Vec::new();
        while next.order.len() > self.capacity {
            if let Some(hash) = next.order.pop_back() {
                next.entries.remove(&hash);
                evicted.push(hash);
            }
        }

        if let Some(ref path) = self.path {
            write_entries(path, &next.snapshot())?;
        }
        for hash in evicted {
            tracing::debug!("Evicted cached report pointer {}", hash);
        }
        *state = next;
        Ok(true)
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Read entries from the store file. A missing file is an empty list.
fn read_entries(path: &Path) -> Result<Vec<CacheEntry>, CacheError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = serde_json::from_str(&contents)?;
    let list = match value {
        serde_json::Value::Object(mut map) => map
            .remove(STORAGE_KEY)
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

/// Rewrite the store file, keeping any unrelated keys it holds.
fn write_entries(path: &Path, entries: &[CacheEntry]) -> Result<(), CacheError> {
    let mut store = fs::read_to_string(path)
        .ok()
        .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
        .and_then(|v| match v {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();
    store.insert(STORAGE_KEY.to_string(), serde_json::to_value(entries)?);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&store)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
