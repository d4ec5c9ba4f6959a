//! # PDF Upload Stash
//!
//! Holds uploaded statements between the page-count call and the extraction
//! call so the client does not have to send the file twice.
//!
//! Each upload lives in its own [`TempDir`]; dropping an entry removes the
//! directory from disk. Entries belong to the user who uploaded them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_CAPACITY: usize = 64;

struct StashEntry {
    owner: String,
    dir: TempDir,
    stored_at: Instant,
}

/// Shared, cloneable handle to the stash.
#[derive(Clone)]
pub struct PdfUploadStash {
    entries: Arc<Mutex<HashMap<String, StashEntry>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for PdfUploadStash {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl PdfUploadStash {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StashEntry>> {
        // A panic while holding the lock leaves the map usable
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `dir` for `owner` and return its id.
    ///
    /// Expired entries are dropped first. When the stash is still full the
    /// oldest entry is evicted.
    pub fn insert(&self, owner: &str, dir: TempDir) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut entries = self.lock();

        entries.retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);

        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("[STASH] Evicting upload {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }

        entries.insert(
            id.clone(),
            StashEntry {
                owner: owner.to_string(),
                dir,
                stored_at: now,
            },
        );
        id
    }

    /// Remove and return the upload for `id`, unless it has expired.
    ///
    /// Another user's id is treated as unknown and the entry stays in place.
    pub fn take(&self, owner: &str, id: &str) -> Option<TempDir> {
        let entry = {
            let mut entries = self.lock();
            if entries.get(id)?.owner != owner {
                debug!("[STASH] Upload {} requested by another user", id);
                return None;
            }
            entries.remove(id)?
        };
        if entry.stored_at.elapsed() >= self.ttl {
            debug!("[STASH] Upload {} expired", id);
            return None;
        }
        Some(entry.dir)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Path of the stored statement inside an upload dir.
pub fn statement_path(dir: &TempDir) -> PathBuf {
    dir.path().join(super::pdf::STATEMENT_FILE_NAME)
}
