use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::CacheStore;
use crate::error::{OrmError, OrmResult};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct Entry {
    written_at: DateTime<Utc>,
    bytes: Vec<u8>,
}

/// In-process [`CacheStore`] keyed by path.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock: Arc::new(Utc::now),
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` instead of the system time when stamping and aging entries.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock: Arc::new(clock),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }
}

impl CacheStore for MemoryStore {
    fn exists(&self, path: &str) -> bool {
        self.entries().contains_key(path)
    }

    fn is_expired(&self, path: &str, ttl_secs: u64) -> bool {
        let now = (self.clock)();
        match self.entries().get(path) {
            Some(entry) => {
                let age = now.signed_duration_since(entry.written_at).num_seconds();
                age < 0 || age as u64 >= ttl_secs
            }
            None => true,
        }
    }

    fn read(&self, path: &str) -> OrmResult<Vec<u8>> {
        self.entries()
            .get(path)
            .map(|entry| entry.bytes.clone())
            .ok_or_else(|| OrmError::cache(format!("no entry at `{path}`")))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> OrmResult<()> {
        let entry = Entry {
            written_at: (self.clock)(),
            bytes: bytes.to_vec(),
        };
        self.entries().insert(path.to_string(), entry);
        Ok(())
    }
}
