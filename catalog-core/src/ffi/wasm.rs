/// WASM bindings for the catalog web client
///
/// Exposes hashing, the entry codec and the catalog merger to JavaScript via
/// wasm-bindgen. Timestamps cross the boundary as JS numbers and must be
/// integral.
///
/// Build:
///   cargo build -p catalog-core --target wasm32-unknown-unknown --features wasm --release
///   wasm-bindgen --out-dir pkg --target web target/wasm32-unknown-unknown/release/catalog_core.wasm
use wasm_bindgen::prelude::*;

use crate::bridge::{self, timestamp_from_f64, timestamp_to_f64, EntryRecord, SharedCatalog};

fn js_err<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ─────────────────────── Initialization ───────────────────────

/// Install the panic hook so Rust panics reach the browser console
#[wasm_bindgen(start)]
pub fn wasm_init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    crate::VERSION.to_string()
}

// ─────────────────────── Hashing (FNV-1a) ───────────────────────

#[wasm_bindgen(js_name = hashString)]
pub fn hash_string(text: &str) -> u32 {
    bridge::hash_string(text)
}

#[wasm_bindgen(js_name = hashToHex)]
pub fn hash_to_hex(hash: u32) -> String {
    bridge::hash_to_hex(hash)
}

#[wasm_bindgen(js_name = contentId)]
pub fn content_id(text: &str) -> String {
    bridge::content_id(text)
}

// ─────────────────────── Entry codec ───────────────────────

/// Encode an entry. Returns a Uint8Array frame
#[wasm_bindgen(js_name = encodeEntry)]
pub fn encode_entry(
    source_url: &str,
    magnet: &str,
    title: &str,
    added_by: &str,
    preview: &str,
    timestamp: f64,
) -> Result<Vec<u8>, JsValue> {
    let timestamp = timestamp_from_f64(timestamp).map_err(js_err)?;
    bridge::encode_entry(source_url, magnet, title, added_by, preview, timestamp).map_err(js_err)
}

/// Decode a frame into `{ sourceURL, magnet, title, addedBy, preview, timestamp }`
#[wasm_bindgen(js_name = decodeEntry)]
pub fn decode_entry(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let entry = bridge::decode_entry(bytes).map_err(js_err)?;
    let record = EntryRecord::try_from(&entry).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&record).map_err(js_err)
}

/// Byte length of the frame at the start of `bytes`
#[wasm_bindgen(js_name = sizeOf)]
pub fn size_of(bytes: &[u8]) -> Result<u32, JsValue> {
    let len = bridge::size_of(bytes).map_err(js_err)?;
    u32::try_from(len).map_err(js_err)
}

#[wasm_bindgen(js_name = encodeEntryBase64)]
pub fn encode_entry_base64(
    source_url: &str,
    magnet: &str,
    title: &str,
    added_by: &str,
    preview: &str,
    timestamp: f64,
) -> Result<String, JsValue> {
    let timestamp = timestamp_from_f64(timestamp).map_err(js_err)?;
    bridge::encode_entry_base64(source_url, magnet, title, added_by, preview, timestamp)
        .map_err(js_err)
}

#[wasm_bindgen(js_name = decodeEntryBase64)]
pub fn decode_entry_base64(text: &str) -> Result<JsValue, JsValue> {
    let entry = bridge::decode_entry_base64(text).map_err(js_err)?;
    let record = EntryRecord::try_from(&entry).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&record).map_err(js_err)
}

// ─────────────────────── URL slugs ───────────────────────

#[wasm_bindgen(js_name = extractSlug)]
pub fn extract_slug(url: &str) -> String {
    crate::slug::extract_slug(url)
}

#[wasm_bindgen(js_name = extractTitle)]
pub fn extract_title(url: &str) -> String {
    crate::slug::extract_title(url)
}

#[wasm_bindgen(js_name = normalizeSearchQuery)]
pub fn normalize_search_query(query: &str) -> String {
    crate::slug::normalize_search_query(query)
}

// ─────────────────────── Catalog merger ───────────────────────

/// One catalog replica. Free with `.free()` when done
///
/// Methods take `&self`, so `m.mergeFrom(m)` is a no-op rather than a
/// recursive-borrow error.
#[wasm_bindgen]
pub struct CatalogMerger {
    inner: SharedCatalog,
}

#[wasm_bindgen]
impl CatalogMerger {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CatalogMerger {
        CatalogMerger {
            inner: SharedCatalog::new(),
        }
    }

    /// Returns true if the entry was stored
    #[wasm_bindgen(js_name = addEntry)]
    pub fn add_entry(
        &self,
        source_url: &str,
        magnet: &str,
        title: &str,
        added_by: &str,
        preview: &str,
        timestamp: f64,
    ) -> Result<bool, JsValue> {
        let timestamp = timestamp_from_f64(timestamp).map_err(js_err)?;
        Ok(self
            .inner
            .borrow_mut()
            .add_entry(source_url, magnet, title, added_by, preview, timestamp))
    }

    /// Decode a received frame and add it. Throws on malformed input
    #[wasm_bindgen(js_name = applyFrame)]
    pub fn apply_frame(&self, bytes: &[u8]) -> Result<bool, JsValue> {
        self.inner.borrow_mut().apply_frame(bytes).map_err(js_err)
    }

    /// Returns the number of changed entries
    #[wasm_bindgen(js_name = mergeFrom)]
    pub fn merge_from(&self, other: &CatalogMerger) -> u32 {
        self.inner.merge_from(&other.inner) as u32
    }

    /// `sourceURL|magnet|title|addedBy|timestamp`, or "" if absent
    #[wasm_bindgen(js_name = getEntry)]
    pub fn get_entry(&self, key: &str) -> String {
        self.inner.borrow().get_entry(key)
    }

    /// Full entry object, or undefined if absent
    #[wasm_bindgen(js_name = getRecord)]
    pub fn get_record(&self, key: &str) -> Result<JsValue, JsValue> {
        let catalog = self.inner.borrow();
        match catalog.map().get(key) {
            Some(entry) => {
                let record = EntryRecord::try_from(entry).map_err(js_err)?;
                serde_wasm_bindgen::to_value(&record).map_err(js_err)
            }
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = hasEntry)]
    pub fn has_entry(&self, key: &str) -> bool {
        self.inner.borrow().has_entry(key)
    }

    /// Stored timestamp, 0 if absent. Throws if it is not a safe integer
    #[wasm_bindgen(js_name = getTimestamp)]
    pub fn get_timestamp(&self, key: &str) -> Result<f64, JsValue> {
        timestamp_to_f64(self.inner.borrow().get_timestamp(key)).map_err(js_err)
    }

    #[wasm_bindgen(js_name = getCount)]
    pub fn get_count(&self) -> u32 {
        self.inner.borrow().get_count() as u32
    }

    /// Matching entries as an array of objects
    pub fn search(&self, query: &str) -> Result<JsValue, JsValue> {
        let catalog = self.inner.borrow();
        let records = bridge::entry_records(catalog.map().search(query)).map_err(js_err)?;
        serde_wasm_bindgen::to_value(&records).map_err(js_err)
    }

    #[wasm_bindgen(js_name = stateHash)]
    pub fn state_hash(&self) -> String {
        self.inner.borrow().state_hash()
    }

    #[wasm_bindgen(js_name = exportState)]
    pub fn export_state(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.borrow().export_state().map_err(js_err)
    }

    /// Merge a snapshot from `exportState`. Returns the number of changed entries
    #[wasm_bindgen(js_name = importState)]
    pub fn import_state(&self, bytes: &[u8]) -> Result<u32, JsValue> {
        self.inner
            .borrow_mut()
            .import_state(bytes)
            .map(|changed| changed as u32)
            .map_err(js_err)
    }
}

impl Default for CatalogMerger {
    fn default() -> Self {
        Self::new()
    }
}
