use crate::error::Result;
use crate::fingerprint::fingerprint_file;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Path → content fingerprint table
pub const FINGERPRINTS_FILE: &str = "file_hashes.json";

/// Generation key → generated text table
pub const CONTENT_FILE: &str = "content_cache.json";

type Table = BTreeMap<String, String>;

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub enabled: bool,
    pub tracked_files: usize,
    pub cached_items: usize,
    pub cache_dir: PathBuf,
}

/// Content fingerprints plus a keyed cache of generated text.
///
/// Both tables are loaded eagerly and written back atomically after each
/// mutation. Missing or corrupt files load as empty tables. When disabled,
/// every path reads as changed and the content cache never hits.
///
/// Disk writes happen outside the table locks, so lookups never wait on IO.
pub struct CacheStore {
    dir: PathBuf,
    enabled: bool,
    fingerprints: Mutex<Table>,
    content: Mutex<Table>,
    /// Hashes seen by `detect_changed`, recorded by `update` instead of rehashing
    observed: Mutex<HashMap<String, String>>,
    /// Serializes snapshot writes so a newer snapshot is never overwritten by an older one
    flush: Mutex<()>,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        let dir = dir.into();
        let (fingerprints, content) = if enabled {
            (
                load_table(&dir.join(FINGERPRINTS_FILE)),
                load_table(&dir.join(CONTENT_FILE)),
            )
        } else {
            (Table::new(), Table::new())
        };

        log::debug!(
            "Cache at {} ({} fingerprints, {} cached items, enabled={enabled})",
            dir.display(),
            fingerprints.len(),
            content.len()
        );

        Self {
            dir,
            enabled,
            fingerprints: Mutex::new(fingerprints),
            content: Mutex::new(content),
            observed: Mutex::new(HashMap::new()),
            flush: Mutex::new(()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when the file has no stored fingerprint, differs from it, or cannot be read
    pub fn has_changed(&self, path: &Path) -> bool {
        if !self.enabled {
            return true;
        }
        let Ok(current) = fingerprint_file(path) else {
            return true;
        };
        let stored = lock(&self.fingerprints).get(&path_key(path)).cloned();
        stored.as_deref() != Some(current.as_str())
    }

    /// Subset of `paths` that changed, in input order.
    ///
    /// The hash of each changed file is remembered, so a later `update` records
    /// the content that was detected rather than whatever is on disk by then.
    pub fn detect_changed<'a>(&self, paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<PathBuf> {
        let mut changed = Vec::new();
        let mut observed = HashMap::new();
        for path in paths {
            if !self.enabled {
                changed.push(path.clone());
                continue;
            }
            let key = path_key(path);
            let Ok(current) = fingerprint_file(path) else {
                changed.push(path.clone());
                continue;
            };
            let unchanged = lock(&self.fingerprints).get(&key) == Some(&current);
            if !unchanged {
                observed.insert(key, current);
                changed.push(path.clone());
            }
        }
        lock(&self.observed).extend(observed);
        log::info!("Detected {} changed files", changed.len());
        changed
    }

    /// Record fingerprints; only call with paths whose units succeeded.
    ///
    /// Uses the hash seen by `detect_changed` when there is one, otherwise
    /// hashes the file now.
    pub fn update<'a>(&self, paths: impl IntoIterator<Item = &'a PathBuf>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut hashes = Vec::new();
        for path in paths {
            let key = path_key(path);
            let seen = lock(&self.observed).remove(&key);
            match seen.map_or_else(|| fingerprint_file(path), Ok) {
                Ok(hash) => hashes.push((key, hash)),
                Err(err) => log::warn!("Cannot fingerprint {}: {err}", path.display()),
            }
        }
        log::debug!("Updated {} fingerprints", hashes.len());

        let _flush = lock(&self.flush);
        let snapshot = {
            let mut table = lock(&self.fingerprints);
            table.extend(hashes);
            serde_json::to_vec_pretty(&*table)?
        };
        save_bytes(&self.dir, FINGERPRINTS_FILE, &snapshot)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        lock(&self.content).get(key).cloned()
    }

    /// Insert and persist; the table lock is released before the file is written
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        lock(&self.content).insert(key.to_string(), value.to_string());

        let _flush = lock(&self.flush);
        let snapshot = serde_json::to_vec_pretty(&*lock(&self.content))?;
        save_bytes(&self.dir, CONTENT_FILE, &snapshot)
    }

    /// Drop both tables in memory and on disk
    pub fn clear(&self) -> Result<()> {
        let _flush = lock(&self.flush);
        lock(&self.fingerprints).clear();
        lock(&self.observed).clear();
        lock(&self.content).clear();
        for name in [FINGERPRINTS_FILE, CONTENT_FILE] {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        log::info!("Cache cleared at {}", self.dir.display());
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            tracked_files: lock(&self.fingerprints).len(),
            cached_items: lock(&self.content).len(),
            cache_dir: self.dir.clone(),
        }
    }
}

/// Guarded data is plain strings, so a panicked writer cannot leave it inconsistent
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn path_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn load_table(path: &Path) -> Table {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Table::new(),
        Err(err) => {
            log::warn!("Cannot read cache file {}: {err}", path.display());
            return Table::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(table) => table,
        Err(err) => {
            log::warn!("Ignoring corrupt cache file {}: {err}", path.display());
            Table::new()
        }
    }
}

fn save_bytes(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    if let Err(err) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}
