/// Host bridge: platform-neutral adapters between host values and the
/// catalog engine.
///
/// The wasm and C ABI bindings in `ffi` are thin wrappers over this module:
/// all argument validation, error mapping and logging happens here so it can
/// be tested without a host.
///
/// Read accessors follow host conventions: an absent key reads as `""` or 0
/// rather than `None`.
use std::cell::{Ref, RefCell, RefMut};

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use catalog_protocol::codec::{self, CodecError};
use catalog_protocol::{Entry, LwwRegisterMap};

pub use catalog_protocol::hashing::{content_id, hash_string, hash_to_hex};

/// Largest integer a JS number holds exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Malformed entry: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timestamp must be an integer within ±2^53, got {0}")]
    InvalidTimestamp(f64),

    #[error("Timestamp {0} cannot be represented exactly as a host number")]
    TimestampOutOfRange(i64),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

// ---------------------------------------------------------------------------
// Host record
// ---------------------------------------------------------------------------

/// Entry as a JS host sees it: same field names, timestamp as a number.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EntryRecord {
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub magnet: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "addedBy")]
    pub added_by: String,
    #[serde(default)]
    pub preview: String,
    pub timestamp: f64,
}

impl TryFrom<&Entry> for EntryRecord {
    type Error = BridgeError;

    fn try_from(entry: &Entry) -> Result<EntryRecord> {
        Ok(EntryRecord {
            source_url: entry.source_url.clone(),
            magnet: entry.magnet.clone(),
            title: entry.title.clone(),
            added_by: entry.added_by.clone(),
            preview: entry.preview.clone(),
            timestamp: timestamp_to_f64(entry.timestamp)?,
        })
    }
}

impl TryFrom<EntryRecord> for Entry {
    type Error = BridgeError;

    fn try_from(record: EntryRecord) -> Result<Entry> {
        let timestamp = timestamp_from_f64(record.timestamp)?;
        Ok(Entry::new(record.source_url, record.magnet, timestamp)
            .with_title(record.title)
            .with_added_by(record.added_by)
            .with_preview(record.preview))
    }
}

/// Convert a host number to a timestamp. Rejects NaN, infinities,
/// fractions, and values a JS number cannot hold exactly.
pub fn timestamp_from_f64(value: f64) -> Result<i64> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > MAX_SAFE_INTEGER {
        return Err(BridgeError::InvalidTimestamp(value));
    }
    Ok(value as i64)
}

/// Convert a timestamp to a host number. Timestamps from remote peers may
/// exceed what a JS number holds exactly; those are rejected rather than
/// rounded.
pub fn timestamp_to_f64(timestamp: i64) -> Result<f64> {
    let value = timestamp as f64;
    if value.abs() > MAX_SAFE_INTEGER {
        return Err(rejected("timestamp", BridgeError::TimestampOutOfRange(timestamp)));
    }
    Ok(value)
}

/// Host views of several entries. Fails if any timestamp is out of range.
pub fn entry_records<'a, I>(entries: I) -> Result<Vec<EntryRecord>>
where
    I: IntoIterator<Item = &'a Entry>,
{
    entries.into_iter().map(EntryRecord::try_from).collect()
}

fn build_entry(
    source_url: &str,
    magnet: &str,
    title: &str,
    added_by: &str,
    preview: &str,
    timestamp: i64,
) -> Entry {
    Entry::new(source_url, magnet, timestamp)
        .with_title(title)
        .with_added_by(added_by)
        .with_preview(preview)
}

fn rejected<E: std::fmt::Display>(what: &str, err: E) -> E {
    log::warn!("Rejected {}: {}", what, err);
    err
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Encode the six entry fields into one frame.
pub fn encode_entry(
    source_url: &str,
    magnet: &str,
    title: &str,
    added_by: &str,
    preview: &str,
    timestamp: i64,
) -> Result<Vec<u8>> {
    let entry = build_entry(source_url, magnet, title, added_by, preview, timestamp);
    Ok(codec::encode(&entry)?)
}

/// [`encode_entry`] as base64, for text-only gossip channels.
pub fn encode_entry_base64(
    source_url: &str,
    magnet: &str,
    title: &str,
    added_by: &str,
    preview: &str,
    timestamp: i64,
) -> Result<String> {
    let bytes = encode_entry(source_url, magnet, title, added_by, preview, timestamp)?;
    Ok(B64.encode(bytes))
}

/// Decode one frame. Malformed input is logged and returned as an error.
pub fn decode_entry(bytes: &[u8]) -> Result<Entry> {
    codec::decode(bytes)
        .map_err(|e| rejected("entry frame", e))
        .map_err(BridgeError::from)
}

pub fn decode_entry_base64(text: &str) -> Result<Entry> {
    let bytes = B64
        .decode(text.trim())
        .map_err(|e| rejected("base64 entry", e))?;
    decode_entry(&bytes)
}

/// Decode one frame and render it as a JSON object with host field names.
pub fn decode_entry_json(bytes: &[u8]) -> Result<String> {
    let entry = decode_entry(bytes)?;
    Ok(serde_json::to_string(&entry)?)
}

/// Total frame length declared by the header at the start of `bytes`.
pub fn size_of(bytes: &[u8]) -> Result<usize> {
    codec::encoded_len(bytes)
        .map_err(|e| rejected("frame header", e))
        .map_err(BridgeError::from)
}

// ---------------------------------------------------------------------------
// Catalog handle
// ---------------------------------------------------------------------------

/// One replica of the catalog, owned by the host.
#[derive(Clone, Debug, Default)]
pub struct CatalogHandle {
    map: LwwRegisterMap,
}

impl CatalogHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> &LwwRegisterMap {
        &self.map
    }

    /// Offer an entry built from the six fields. Returns `true` if stored.
    pub fn add_entry(
        &mut self,
        source_url: &str,
        magnet: &str,
        title: &str,
        added_by: &str,
        preview: &str,
        timestamp: i64,
    ) -> bool {
        self.map
            .add_entry(build_entry(source_url, magnet, title, added_by, preview, timestamp))
    }

    /// Decode a received frame and offer it to the map.
    pub fn apply_frame(&mut self, bytes: &[u8]) -> Result<bool> {
        let entry = decode_entry(bytes)?;
        Ok(self.map.add_entry(entry))
    }

    /// Merge another replica into this one. Returns the number of changed keys.
    pub fn merge_from(&mut self, other: &CatalogHandle) -> usize {
        self.map.merge_entries(&other.map)
    }

    /// Summary string, or `""` if the key is absent.
    pub fn get_entry(&self, key: &str) -> String {
        self.map.get_entry(key).unwrap_or_default()
    }

    pub fn has_entry(&self, key: &str) -> bool {
        self.map.has_entry(key)
    }

    /// Stored timestamp, or 0 if the key is absent.
    pub fn get_timestamp(&self, key: &str) -> i64 {
        self.map.get_timestamp(key)
    }

    pub fn get_count(&self) -> usize {
        self.map.count()
    }

    /// Full entry as JSON, or `None` if the key is absent.
    pub fn get_entry_json(&self, key: &str) -> Result<Option<String>> {
        self.map
            .get(key)
            .map(serde_json::to_string)
            .transpose()
            .map_err(BridgeError::from)
    }

    /// Matching entries as a JSON array.
    pub fn search_json(&self, query: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.map.search(query))?)
    }

    pub fn state_hash(&self) -> String {
        self.map.state_hash_hex()
    }

    /// Snapshot of every entry for persistence or full sync.
    pub fn export_state(&self) -> Result<Vec<u8>> {
        Ok(self.map.to_bytes()?)
    }

    pub fn export_state_base64(&self) -> Result<String> {
        Ok(B64.encode(self.export_state()?))
    }

    /// Merge a snapshot from [`export_state`](Self::export_state). Returns the
    /// number of changed keys. A malformed snapshot leaves the map untouched.
    pub fn import_state(&mut self, bytes: &[u8]) -> Result<usize> {
        let remote = LwwRegisterMap::from_bytes(bytes).map_err(|e| rejected("snapshot", e))?;
        Ok(self.map.merge_entries(&remote))
    }

    pub fn import_state_base64(&mut self, text: &str) -> Result<usize> {
        let bytes = B64
            .decode(text.trim())
            .map_err(|e| rejected("base64 snapshot", e))?;
        self.import_state(&bytes)
    }
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// A [`CatalogHandle`] behind a `RefCell`, for hosts that hand out shared
/// references to the same replica (wasm-bindgen objects).
///
/// Every method takes `&self`, so merging a replica into itself only needs
/// two shared borrows of the same object and is a no-op.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    inner: RefCell<CatalogHandle>,
}

impl SharedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, CatalogHandle> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, CatalogHandle> {
        self.inner.borrow_mut()
    }

    /// Merge `other` into this replica. Returns the number of changed keys.
    pub fn merge_from(&self, other: &SharedCatalog) -> usize {
        if std::ptr::eq(self, other) {
            return 0;
        }
        let other = other.inner.borrow();
        self.inner.borrow_mut().merge_from(&other)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
