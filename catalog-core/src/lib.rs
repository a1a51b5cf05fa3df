// ── Re-export catalog protocol modules ─────────────────────────────────────
// The merge engine lives in the standalone `catalog-protocol` crate; hosts
// link this crate and get the engine plus bindings.
pub use catalog_protocol::codec;
pub use catalog_protocol::crdt;
pub use catalog_protocol::hashing;
pub use catalog_protocol::slug;

// ── Local modules (host-facing, not part of the protocol) ──────────────────
pub mod bridge;
pub mod ffi;

// ── Re-export main types ───────────────────────────────────────────────────
pub use bridge::{BridgeError, CatalogHandle, EntryRecord, SharedCatalog};
pub use catalog_protocol::{
    content_id, hash_string, hash_to_hex, CodecError, Crdt, Entry, LwwRegisterMap,
};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version
pub fn get_version() -> &'static str {
    VERSION
}
