//! # Catalog Protocol
//!
//! **Replicated catalog core for a peer-to-peer media index.**
//!
//! Each peer keeps its own copy of a shared catalog of entries (source URL,
//! magnet link, title, author, preview, timestamp) and exchanges them over
//! gossip. Replicas converge without coordination:
//!
//! - **Content hashing**: 32-bit FNV-1a identifiers, identical on every peer
//! - **Wire codec**: versioned, length-prefixed, big-endian entry frames
//! - **LWW register map**: one entry per `sourceURL`, newest timestamp wins
//!
//! ## Quick Start
//!
//! ```rust
//! use catalog_protocol::{content_id, Entry, LwwRegisterMap};
//!
//! let mut local = LwwRegisterMap::new();
//! local.add_entry(Entry::new("https://forum.example/t/sintel/42", "magnet:?xt=1", 100));
//!
//! let bytes = local.get("https://forum.example/t/sintel/42").unwrap().to_bytes().unwrap();
//! let received = Entry::from_bytes(&bytes).unwrap();
//!
//! let mut remote = LwwRegisterMap::new();
//! remote.add_entry(received);
//! assert_eq!(remote, local);
//! assert_eq!(content_id("").len(), 8);
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`hashing`] | FNV-1a content hashing and hex content ids |
//! | [`codec`] | Entry frame and snapshot encoding |
//! | [`crdt`] | Entry record, guardrails, LWW register map |
//! | [`slug`] | Slugs, titles and announce keys derived from source URLs |

// ── Public modules ──────────────────────────────────────────────────────────

/// Binary wire format for entries and catalog snapshots.
pub mod codec;

/// Catalog CRDT: entries, limits, LWW register map.
pub mod crdt;

/// 32-bit FNV-1a content hashing.
pub mod hashing;

/// URL slug and title extraction.
pub mod slug;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use codec::{decode, decode_batch, encode, encode_batch, encoded_len, CodecError, FieldTag};
pub use crdt::{Crdt, Entry, LwwRegisterMap};
pub use hashing::{content_id, hash_string, hash_to_hex, ContentHash, Fnv1a, HashError};
pub use slug::{announce_hash, announce_key, extract_slug, extract_title, normalize_search_query};

// ── Library metadata ────────────────────────────────────────────────────────

/// Catalog protocol version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the protocol crate version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────
