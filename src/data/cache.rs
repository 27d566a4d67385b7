//! Age-bounded local caching of raw element set text
//!
//! The raw feed text is kept in a durable key-value slot together with the
//! time it was fetched. Entries older than the configured maximum age are
//! purged before a read can count as a hit.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::UpstreamFetcher;
use crate::error::{store_err, Error, Result};
use crate::telemetry::Telemetry;

/// Metadata stored alongside a cached blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub fetched_at: DateTime<Utc>,
}

/// Bytes plus metadata held in one cache slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub metadata: BlobMetadata,
}

/// Durable key -> (bytes, metadata) storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoredBlob>>;
    /// Replace the slot; readers see either the old or the new blob, never a mix
    fn set(&self, key: &str, blob: &StoredBlob) -> Result<()>;
    /// Remove the slot. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, StoredBlob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredBlob>> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn set(&self, key: &str, blob: &StoredBlob) -> Result<()> {
        self.slots.write().insert(key.to_string(), blob.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.slots.write().remove(key);
        Ok(())
    }
}

/// One file per key: a JSON metadata line followed by the raw bytes.
///
/// Writes go to a temporary file that is renamed over the slot.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.cache", safe))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<StoredBlob>> {
        let path = self.slot_path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_err(&path, e)),
        };

        let split = raw
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| Error::CacheCorrupt(format!("{:?} has no metadata header", path)))?;
        let metadata: BlobMetadata = serde_json::from_slice(&raw[..split])
            .map_err(|e| Error::CacheCorrupt(format!("{:?} metadata: {}", path, e)))?;

        Ok(Some(StoredBlob {
            bytes: raw[split + 1..].to_vec(),
            metadata,
        }))
    }

    fn set(&self, key: &str, blob: &StoredBlob) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| store_err(&self.dir, e))?;

        let path = self.slot_path(key);
        let temp_path = path.with_extension("tmp");

        let mut contents = serde_json::to_vec(&blob.metadata)
            .map_err(|e| Error::CacheCorrupt(format!("metadata encoding: {}", e)))?;
        contents.push(b'\n');
        contents.extend_from_slice(&blob.bytes);

        fs::write(&temp_path, &contents).map_err(|e| store_err(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| store_err(&path, e))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_err(&path, e)),
        }
    }
}

/// Source of "now" for freshness decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// How a load was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Fresh cached text was used
    Hit,
    /// Nothing was cached
    Miss,
    /// The cached entry was older than the maximum age and was purged
    Expired,
    /// The cached entry failed to decode or parse and was purged
    Corrupt,
}

enum Lookup {
    Fresh(String),
    Absent(CacheOutcome),
}

/// Decides between reusing cached text and refetching from upstream
pub struct CacheManager {
    store: Box<dyn KeyValueStore>,
    fetcher: Box<dyn UpstreamFetcher>,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn Telemetry>,
    key: String,
    max_age: chrono::Duration,
    // Held by lookups, purges and rewrites so none observes another half done
    write_lock: Mutex<()>,
}

impl CacheManager {
    pub fn new(
        store: Box<dyn KeyValueStore>,
        fetcher: Box<dyn UpstreamFetcher>,
        clock: Arc<dyn Clock>,
        telemetry: Arc<dyn Telemetry>,
        key: impl Into<String>,
        max_age: chrono::Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
            telemetry,
            key: key.into(),
            max_age,
            write_lock: Mutex::new(()),
        }
    }

    pub fn max_age(&self) -> chrono::Duration {
        self.max_age
    }

    /// Cached text if fresh, otherwise freshly fetched (and stored) text
    pub fn get_or_fetch(&self) -> Result<String> {
        self.load_with(|text| Ok(text.to_string()))
            .map(|(text, _)| text)
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), decoding the text with `decode`.
    ///
    /// Cached text that fails to decode is purged and refetched. Fetched
    /// text is only stored once it decodes, so a bad upstream payload is
    /// never cached; its decode error goes to the caller.
    pub fn load_with<T>(&self, decode: impl Fn(&str) -> Result<T>) -> Result<(T, CacheOutcome)> {
        let outcome = match self.lookup() {
            Lookup::Fresh(text) => match decode(&text) {
                Ok(value) => {
                    log::info!("Loaded {} bytes of cached element sets", text.len());
                    return Ok((value, CacheOutcome::Hit));
                }
                Err(e) => {
                    self.telemetry.warn(
                        &Error::CacheCorrupt(format!("cached text failed to parse: {}", e))
                            .to_string(),
                    );
                    self.purge_quietly();
                    CacheOutcome::Corrupt
                }
            },
            Lookup::Absent(outcome) => outcome,
        };

        let text = self.fetch()?;
        let value = decode(&text)?;
        self.store_text(&text);
        Ok((value, outcome))
    }

    /// Remove the cached entry
    pub fn purge(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.store.delete(&self.key)
    }

    fn lookup(&self) -> Lookup {
        const SPAN: &str = "Checked element set cache";
        self.telemetry.start(SPAN);
        let lookup = self.lookup_inner();
        self.telemetry.end(SPAN);
        lookup
    }

    fn lookup_inner(&self) -> Lookup {
        // Readers wait out an in-progress rewrite
        let _guard = self.write_lock.lock();

        let blob = match self.store.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Lookup::Absent(CacheOutcome::Miss),
            Err(e) => {
                self.telemetry.warn(&format!("Unreadable cache entry: {}", e));
                self.discard_entry();
                return Lookup::Absent(CacheOutcome::Corrupt);
            }
        };

        let age = self.clock.now() - blob.metadata.fetched_at;
        if age < chrono::Duration::zero() {
            log::warn!(
                "Cached element sets are dated {}s in the future, purging",
                -age.num_seconds()
            );
            self.discard_entry();
            return Lookup::Absent(CacheOutcome::Expired);
        }
        if age > self.max_age {
            log::info!(
                "Cached element sets are {}s old (max {}s), purging",
                age.num_seconds(),
                self.max_age.num_seconds()
            );
            self.discard_entry();
            return Lookup::Absent(CacheOutcome::Expired);
        }

        match String::from_utf8(blob.bytes) {
            Ok(text) => Lookup::Fresh(text),
            Err(_) => {
                self.telemetry
                    .warn(&Error::CacheCorrupt("not UTF-8".to_string()).to_string());
                self.discard_entry();
                Lookup::Absent(CacheOutcome::Corrupt)
            }
        }
    }

    fn fetch(&self) -> Result<String> {
        const SPAN: &str = "Fetched element sets from upstream";
        self.telemetry.start(SPAN);
        let result = self.fetcher.fetch_raw_text();
        self.telemetry.end(SPAN);

        match result {
            Ok(text) => {
                log::info!("Fetched {} bytes of element sets", text.len());
                Ok(text)
            }
            Err(e) => {
                self.telemetry.error(&e.to_string());
                Err(e)
            }
        }
    }

    fn store_text(&self, text: &str) {
        const SPAN: &str = "Cached element sets";
        self.telemetry.start(SPAN);
        let blob = StoredBlob {
            bytes: text.as_bytes().to_vec(),
            metadata: BlobMetadata {
                fetched_at: self.clock.now(),
            },
        };

        // `set` replaces the slot in one step
        let result = {
            let _guard = self.write_lock.lock();
            self.store.set(&self.key, &blob)
        };
        // The data is still usable; only the next load pays for a refetch
        if let Err(e) = result {
            self.telemetry
                .warn(&format!("Failed to cache element sets: {}", e));
        }
        self.telemetry.end(SPAN);
    }

    fn purge_quietly(&self) {
        let _guard = self.write_lock.lock();
        self.discard_entry();
    }

    /// Delete the slot; the caller holds `write_lock`
    fn discard_entry(&self) {
        if let Err(e) = self.store.delete(&self.key) {
            self.telemetry
                .warn(&format!("Failed to purge cached element sets: {}", e));
        }
    }
}
