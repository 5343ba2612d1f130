//! The versioned key-value engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::codec::{
    decode_item, encode_index, encode_item, encode_meta, VERSION_COUNT, VERSION_MAX, VERSION_MIN,
};
use crate::counters::{get_u64, incr_u64, put_u64};
use crate::error::{VkvError, VkvResult};
use crate::types::{KeyValue, KeyValueVersions};

/// Versioned key-value store.
///
/// Every key carries its full time-ordered version history; versions are
/// never mutated after creation, and deletion is a new empty-value version,
/// not physical removal. Keys are raw bytes and order byte-wise, so range
/// bounds like `prefix ‖ 0xFF` behave the same for any key content. All
/// mutating operations are serialized by one engine-wide write mutex;
/// readers scan the backend without taking it.
pub struct VkvStore {
    db: sled::Db,
    path: PathBuf,
    write_mu: Mutex<()>,
    closed: AtomicBool,
}

impl VkvStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path) -> VkvResult<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
            write_mu: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    /// Store `value` for `key` at the given version.
    ///
    /// `None` assigns the current UTC wall clock in nanoseconds. Version 0
    /// is rejected: it is the unset sentinel for the min/max counters. A put
    /// at an existing `(key, version)` overwrites the value without growing
    /// the version count.
    pub fn put(&self, key: &[u8], value: &[u8], version: Option<u64>) -> VkvResult<KeyValue> {
        self.ensure_open()?;
        let version = match version {
            None => now_nanos(),
            Some(0) => {
                return Err(VkvError::InvalidArgument(
                    "version 0 is reserved as the unset sentinel".into(),
                ))
            }
            Some(v) => v,
        };
        let _guard = self.write_mu.lock().expect("write mutex poisoned");

        let min_key = encode_meta(VERSION_MIN, key);
        let max_key = encode_meta(VERSION_MAX, key);
        let min = get_u64(&self.db, &min_key)?;
        let max = get_u64(&self.db, &max_key)?;
        if min == 0 || version < min {
            put_u64(&self.db, &min_key, version)?;
        }
        if max == 0 || version > max {
            put_u64(&self.db, &max_key, version)?;
        }

        let item_key = encode_item(key, version);
        if self.db.get(&item_key)?.is_none() {
            incr_u64(&self.db, &encode_meta(VERSION_COUNT, key), 1)?;
        }
        self.db.insert(item_key, value)?;
        self.db.insert(encode_index(key), &b""[..])?;

        debug!(key = ?key, version, len = value.len(), "put");
        Ok(KeyValue::new(key, value.to_vec(), version))
    }

    /// Read the value of `key` at `version`, or at the latest version when
    /// `None`.
    ///
    /// A deleted (empty-value) version reads back as that empty value;
    /// only an absent version is `NotFound`.
    pub fn get(&self, key: &[u8], version: Option<u64>) -> VkvResult<KeyValue> {
        self.ensure_open()?;
        let version = match version {
            Some(v) => v,
            None => {
                let max = get_u64(&self.db, &encode_meta(VERSION_MAX, key))?;
                if max == 0 {
                    return Err(not_found(key));
                }
                max
            }
        };
        match self.db.get(encode_item(key, version))? {
            Some(value) => Ok(KeyValue::new(key, value.to_vec(), version)),
            None => Err(not_found(key)),
        }
    }

    /// The version history of `key` within `[start, end]`, ascending.
    ///
    /// `limit` 0 means unlimited; `start > end` yields an empty history.
    /// The user key is stripped from the returned rows.
    pub fn versions(
        &self,
        key: &[u8],
        start: u64,
        end: u64,
        limit: usize,
    ) -> VkvResult<KeyValueVersions> {
        self.ensure_open()?;
        let mut history = KeyValueVersions {
            key: key.to_vec(),
            versions: Vec::new(),
        };
        if start > end {
            return Ok(history);
        }
        let lo = encode_item(key, start);
        let hi = encode_item(key, end);
        for item in self.db.range(lo..=hi) {
            let (raw_key, value) = item?;
            let (_, version) = decode_item(&raw_key)?;
            history
                .versions
                .push(KeyValue::new("", value.to_vec(), version));
            if limit != 0 && history.versions.len() >= limit {
                break;
            }
        }
        Ok(history)
    }

    /// All keys in `[start, end]`, ascending byte-wise.
    ///
    /// `limit` 0 means unlimited. A key appears once no matter how many
    /// versions it has. Bounds are raw bytes, so `keys(p, p ‖ 0xFF, 0)`
    /// covers every key starting with `p`.
    pub fn keys(&self, start: &[u8], end: &[u8], limit: usize) -> VkvResult<Vec<Vec<u8>>> {
        self.ensure_open()?;
        let mut result = Vec::new();
        if start > end {
            return Ok(result);
        }
        let lo = encode_index(start);
        let hi = encode_index(end);
        for item in self.db.range(lo..=hi) {
            let (raw_key, _) = item?;
            result.push(raw_key[1..].to_vec());
            if limit != 0 && result.len() >= limit {
                break;
            }
        }
        Ok(result)
    }

    /// Number of stored versions of `key`.
    pub fn version_count(&self, key: &[u8]) -> VkvResult<u64> {
        self.ensure_open()?;
        get_u64(&self.db, &encode_meta(VERSION_COUNT, key))
    }

    /// Smallest stored version of `key`; 0 when the key has none.
    pub fn version_min(&self, key: &[u8]) -> VkvResult<u64> {
        self.ensure_open()?;
        get_u64(&self.db, &encode_meta(VERSION_MIN, key))
    }

    /// Largest stored version of `key`; 0 when the key has none.
    pub fn version_max(&self, key: &[u8]) -> VkvResult<u64> {
        self.ensure_open()?;
        get_u64(&self.db, &encode_meta(VERSION_MAX, key))
    }

    /// Flush and mark the store closed. A second call is an error.
    pub fn close(&self) -> VkvResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(VkvError::Closed);
        }
        self.db.flush()?;
        Ok(())
    }

    /// Close the store and remove its directory. Intended for tests.
    pub fn destroy(self) -> VkvResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(VkvError::InvalidArgument("empty database path".into()));
        }
        let Self { db, path, .. } = self;
        db.flush()?;
        drop(db);
        fs::remove_dir_all(&path)?;
        Ok(())
    }

    fn ensure_open(&self) -> VkvResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(VkvError::Closed);
        }
        Ok(())
    }
}

fn not_found(key: &[u8]) -> VkvError {
    VkvError::NotFound(String::from_utf8_lossy(key).into_owned())
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
