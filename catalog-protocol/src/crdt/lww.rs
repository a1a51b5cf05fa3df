/// LWW register map: one entry per `sourceURL`, newest timestamp wins.
///
/// Each key is either absent or present with some timestamp `T`. A candidate
/// entry replaces the stored one only when its timestamp is strictly greater
/// than `T`; on a tie the stored entry stays. Nothing is ever removed.
///
/// Because `add_entry` keeps the per-key maximum and breaks ties the same way
/// on every replica, `merge_entries` is commutative, associative, and
/// idempotent over any delivery order or duplication of remote state.
///
/// Timestamps are trusted as supplied. Two peers with skewed clocks will
/// converge, but on the entry with the larger clock value, not the one
/// written last in real time.
use indexmap::IndexMap;

use crate::codec::{self, CodecError};
use crate::crdt::entry::Entry;
use crate::crdt::Crdt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LwwRegisterMap {
    /// Insertion-ordered. An overwrite keeps the key's original slot.
    entries: IndexMap<String, Entry>,
}

impl LwwRegisterMap {
    pub fn new() -> Self {
        LwwRegisterMap {
            entries: IndexMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Offer a candidate entry. Returns `true` if it was stored.
    pub fn add_entry(&mut self, candidate: Entry) -> bool {
        match self.entries.get_mut(candidate.key()) {
            None => {
                self.entries.insert(candidate.source_url.clone(), candidate);
                true
            }
            Some(current) if candidate.supersedes(current) => {
                *current = candidate;
                true
            }
            Some(current) => {
                log::debug!(
                    "Keeping {} at t={}, discarding candidate at t={}",
                    current.source_url,
                    current.timestamp,
                    candidate.timestamp
                );
                false
            }
        }
    }

    /// Re-apply every entry of `other` through [`add_entry`](Self::add_entry),
    /// in `other`'s order. Returns how many local registers changed.
    pub fn merge_entries(&mut self, other: &LwwRegisterMap) -> usize {
        let mut changed = 0;
        for entry in other.entries.values() {
            if self.add_entry(entry.clone()) {
                changed += 1;
            }
        }
        log::debug!(
            "Merged {} remote entries, {} changed, {} total",
            other.len(),
            changed,
            self.len()
        );
        changed
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// `sourceURL|magnet|title|addedBy|timestamp`, or `None` if absent.
    pub fn get_entry(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(Entry::summary)
    }

    pub fn has_entry(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored timestamp, or 0 if the key is absent.
    pub fn get_timestamp(&self, key: &str) -> i64 {
        self.entries.get(key).map_or(0, |e| e.timestamp)
    }

    /// Number of distinct keys.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Case-insensitive substring match on `sourceURL` or `title`.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.to_lowercase();
        self.entries
            .values()
            .filter(|e| {
                e.source_url.to_lowercase().contains(&needle)
                    || e.title.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Order-independent digest for convergence checks.
    ///
    /// Entries are hashed in key order with length-prefixed fields, so two
    /// maps with the same content produce the same digest however they were
    /// built.
    pub fn state_hash(&self) -> [u8; 32] {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();

        let mut hasher = blake3::Hasher::new();
        hasher.update(b"WC-STATE");
        hasher.update(&(keys.len() as u64).to_le_bytes());
        for key in keys {
            let entry = &self.entries[key];
            for field in [
                &entry.source_url,
                &entry.magnet,
                &entry.title,
                &entry.added_by,
                &entry.preview,
            ] {
                hasher.update(&(field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
            hasher.update(&entry.timestamp.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    /// Hex form of [`state_hash`](Self::state_hash).
    pub fn state_hash_hex(&self) -> String {
        hex::encode(self.state_hash())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Encode every entry as one snapshot, in insertion order.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        codec::encode_batch(self.entries.values())
    }

    /// Rebuild a map from a snapshot. Entries go through `add_entry`, so a
    /// snapshot with repeated keys still yields the LWW result.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(codec::decode_batch(bytes)?.into_iter().collect())
    }
}

impl Crdt for LwwRegisterMap {
    fn merge(&mut self, other: &Self) {
        self.merge_entries(other);
    }
}

impl Extend<Entry> for LwwRegisterMap {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.add_entry(entry);
        }
    }
}

impl FromIterator<Entry> for LwwRegisterMap {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut map = LwwRegisterMap::new();
        map.extend(iter);
        map
    }
}

impl<'a> IntoIterator for &'a LwwRegisterMap {
    type Item = &'a Entry;
    type IntoIter = indexmap::map::Values<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
