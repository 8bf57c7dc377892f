//! Process-wide version cache (spec §4.6, §9 "global mutable state").
//! Lazily created on first use, lives for the process lifetime, never
//! persisted; a pure performance layer that every consumer must tolerate
//! being empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};

const TTL: Duration = Duration::from_secs(5 * 60);
const MAX_CACHE_ENTRIES: usize = 100;

struct Entry {
    version: String,
    inserted_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= TTL
    }
}

/// Concurrent map from resolved binary path to `{version, timestamp}`.
/// Reads take a shared lock; writes (insert, prune) take an exclusive one.
pub struct VersionCache {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl Default for VersionCache {
    fn default() -> Self {
        VersionCache {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached, non-expired version for `binary`. `force_refresh`
    /// skips the read entirely (the caller is about to re-detect and
    /// overwrite).
    pub fn get(&self, binary: &Path, force_refresh: bool) -> Option<String> {
        if force_refresh {
            return None;
        }
        let entries = self.entries.read().expect("version cache lock poisoned");
        entries.get(binary).and_then(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.version.clone())
            }
        })
    }

    /// Insert or overwrite the cached version for `binary`, pruning if the
    /// map has grown past `MAX_CACHE_ENTRIES` (P7).
    pub fn put(&self, binary: PathBuf, version: String) {
        let mut entries = self.entries.write().expect("version cache lock poisoned");
        entries.insert(
            binary,
            Entry {
                version,
                inserted_at: Instant::now(),
            },
        );
        if entries.len() > MAX_CACHE_ENTRIES {
            prune(&mut entries);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("version cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drop every expired entry first; if still over budget, evict in
/// arbitrary-but-bounded-cost order until at most `MAX_CACHE_ENTRIES`
/// remain (spec §4.6).
fn prune(entries: &mut HashMap<PathBuf, Entry>) {
    entries.retain(|_, entry| !entry.is_expired());
    if entries.len() <= MAX_CACHE_ENTRIES {
        return;
    }
    let overflow = entries.len() - MAX_CACHE_ENTRIES;
    let victims: Vec<PathBuf> = entries.keys().take(overflow).cloned().collect();
    for key in victims {
        entries.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let cache = VersionCache::new();
        let path = PathBuf::from("/usr/bin/node");
        cache.put(path.clone(), "20.11.0".to_string());
        assert_eq!(cache.get(&path, false), Some("20.11.0".to_string()));
    }

    #[test]
    fn force_refresh_bypasses_cache() {
        let cache = VersionCache::new();
        let path = PathBuf::from("/usr/bin/node");
        cache.put(path.clone(), "20.11.0".to_string());
        assert_eq!(cache.get(&path, true), None);
    }

    #[test]
    fn missing_entry_returns_none() {
        let cache = VersionCache::new();
        assert_eq!(cache.get(Path::new("/usr/bin/missing"), false), None);
    }

    // P7: cache never exceeds MAX_CACHE_ENTRIES after an overfill.
    #[test]
    fn property_cache_bound_after_overfill() {
        let cache = VersionCache::new();
        for i in 0..(MAX_CACHE_ENTRIES + 50) {
            cache.put(PathBuf::from(format!("/tool-{i}")), "1.0.0".to_string());
        }
        assert!(cache.len() <= MAX_CACHE_ENTRIES);
    }

    #[test]
    fn expired_entries_are_pruned_first() {
        let mut entries = HashMap::new();
        entries.insert(
            PathBuf::from("/stale"),
            Entry {
                version: "1.0.0".to_string(),
                inserted_at: Instant::now() - Duration::from_secs(600),
            },
        );
        entries.insert(
            PathBuf::from("/fresh"),
            Entry {
                version: "2.0.0".to_string(),
                inserted_at: Instant::now(),
            },
        );
        prune(&mut entries);
        assert!(!entries.contains_key(&PathBuf::from("/stale")));
        assert!(entries.contains_key(&PathBuf::from("/fresh")));
    }
}
