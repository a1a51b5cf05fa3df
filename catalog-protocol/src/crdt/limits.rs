/// Catalog guardrails: wire schema version and size bounds.
///
/// These constants bound what a single peer can make another peer allocate
/// when decoding entries or whole catalog snapshots.

/// Current wire schema version written by the encoder.
pub const SCHEMA_VERSION: u8 = 1;

/// Oldest schema version the decoder still accepts.
pub const MIN_SCHEMA_VERSION: u8 = 1;

/// Max bytes for any single string field. Previews (thumbnails as data URLs)
/// are the large ones.
pub const MAX_FIELD_BYTES: usize = 4 * 1024 * 1024; // 4 MB

/// Max declared body length of one encoded entry.
pub const MAX_ENTRY_BODY_BYTES: usize = 5 * MAX_FIELD_BYTES + 1024;

/// Max entries in one encoded catalog snapshot.
pub const MAX_ENTRIES_PER_BATCH: usize = 100_000;

/// Check a field length against [`MAX_FIELD_BYTES`].
pub fn field_within_limit(len: usize) -> bool {
    len <= MAX_FIELD_BYTES
}

/// Check a schema version against the accepted range.
pub fn is_supported_version(version: u8) -> bool {
    (MIN_SCHEMA_VERSION..=SCHEMA_VERSION).contains(&version)
}
