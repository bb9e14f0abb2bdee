//! Read-through result cache.
//!
//! A SELECT marked with `.cache(key, ttl)` is served from the session's
//! [`CacheStore`] while the stored payload is younger than `ttl` seconds.
//! Otherwise it runs, and the fully hydrated result (relations included) is
//! serialized with `serde_json` and written back. Entries are never evicted
//! proactively; an expired entry is simply overwritten on the next miss.

mod memory;


use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{OrmError, OrmResult};

pub use memory::MemoryStore;

/// Storage backend for cached query results.
pub trait CacheStore {
    fn exists(&self, path: &str) -> bool;

    /// Whether the entry at `path` is at least `ttl_secs` old (or missing).
    fn is_expired(&self, path: &str, ttl_secs: u64) -> bool;

    fn read(&self, path: &str) -> OrmResult<Vec<u8>>;

    fn write(&self, path: &str, bytes: &[u8]) -> OrmResult<()>;
}

/// Storage path for `key`: blake3 hex digest plus the configured suffix.
pub fn cache_path(key: &str, suffix: &str) -> String {
    format!("{}{suffix}", blake3::hash(key.as_bytes()).to_hex())
}

/// Serve from `store` when fresh, otherwise run `fetch` and persist its result.
///
/// A payload that cannot be decoded is reported as `OrmError::Cache`; the
/// query is not silently re-run.
pub(crate) fn read_through<T, F>(
    store: &dyn CacheStore,
    path: &str,
    ttl_secs: u64,
    fetch: F,
) -> OrmResult<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> OrmResult<Vec<T>>,
{
    if store.exists(path) && !store.is_expired(path, ttl_secs) {
        let bytes = store.read(path)?;
        let items = serde_json::from_slice(&bytes)
            .map_err(|e| OrmError::cache(format!("unreadable payload at `{path}`: {e}")))?;
        tracing::debug!(target: "quarry.cache", path, "cache hit");
        return Ok(items);
    }

    tracing::debug!(target: "quarry.cache", path, ttl_secs, "cache miss");
    let items = fetch()?;
    let bytes = serde_json::to_vec(&items)
        .map_err(|e| OrmError::cache(format!("cannot serialize result for `{path}`: {e}")))?;
    store.write(path, &bytes)?;
    Ok(items)
}
