/// Catalog CRDT: a last-writer-wins register map keyed by `sourceURL`.
///
/// Peers hold independent replicas and converge by exchanging whole maps (or
/// single entries) in any order, any number of times.
///
/// # Module structure
/// - `entry`: the immutable catalog record and its summary form
/// - `limits`: schema version and size guardrails
/// - `lww`: LWW register map with merge, search and state hash
pub mod entry;
pub mod limits;
pub mod lww;

pub use entry::Entry;
pub use limits::{MAX_ENTRIES_PER_BATCH, MAX_FIELD_BYTES, SCHEMA_VERSION};
pub use lww::LwwRegisterMap;

/// A state-based replicated type: `merge` is commutative, associative and
/// idempotent, so replicas that have seen the same updates are equal.
pub trait Crdt {
    fn merge(&mut self, other: &Self);
}
