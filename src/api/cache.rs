use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;

/// A cached response value with its expiry time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Key → (value, expiry) store. Memory is authoritative; when a cache
/// directory is configured every mutation is mirrored to one file per key,
/// and valid entries are loaded back at construction. Disk failures are
/// logged and swallowed: caching is an optimization, never a dependency.
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    dir: Option<PathBuf>,
}

impl CacheStore {
    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self {
            entries: HashMap::new(),
            dir: None,
        }
    }

    /// Disk-mirrored store. Loads unexpired entries from `dir` and deletes
    /// any expired files found during the sweep.
    pub fn persistent(dir: PathBuf) -> Self {
        let mut store = Self {
            entries: HashMap::new(),
            dir: Some(dir),
        };
        store.load_from_disk();
        store
    }

    /// Stable cache key for a URL and its query parameters. Parameter order
    /// does not affect the key.
    pub fn cache_key(url: &str, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        for (k, v) in sorted {
            hasher.update(b"&");
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
        }
        hex::encode(&hasher.finalize()[..8])
    }

    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        self.get_at(key, Utc::now())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                self.remove_file(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&mut self, key: &str, value: serde_json::Value, ttl: Duration) {
        self.put_at(key, value, ttl, Utc::now());
    }

    pub(crate) fn put_at(
        &mut self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
        now: DateTime<Utc>,
    ) {
        let entry = CacheEntry {
            value,
            expires_at: now + ttl,
        };
        self.write_file(key, &entry);
        self.entries.insert(key.to_string(), entry);
    }

    /// Empty the memory map and delete all owned cache files.
    pub fn clear(&mut self) {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        for key in &keys {
            self.remove_file(key);
        }
        self.entries.clear();
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{key}.json")))
    }

    fn write_file(&self, key: &str, entry: &CacheEntry) {
        let Some(path) = self.entry_path(key) else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string(entry) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::debug!("cache write failed for {}: {e}", path.display());
                }
            }
            Err(e) => tracing::debug!("cache serialize failed for {key}: {e}"),
        }
    }

    fn remove_file(&self, key: &str) {
        if let Some(path) = self.entry_path(key) {
            let _ = std::fs::remove_file(path);
        }
    }

    fn load_from_disk(&mut self) {
        let Some(dir) = self.dir.clone() else {
            return;
        };
        let Ok(read_dir) = std::fs::read_dir(&dir) else {
            return;
        };
        let now = Utc::now();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            match std::fs::read_to_string(&path)
                .ok()
                .and_then(|s| serde_json::from_str::<CacheEntry>(&s).ok())
            {
                Some(cached) if !cached.is_expired_at(now) => {
                    self.entries.insert(key, cached);
                }
                _ => {
                    // Expired or unreadable: drop the file
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
    }
}
