/// Entry wire codec: the byte layout every peer must agree on.
///
/// Wire format (big-endian throughout):
/// ```text
/// [magic: 2 = "WC"][version: 1][body_len: 4][field]*
/// field = [tag: 1][len: 4][value: len]
/// ```
///
/// | tag | field       | value            | required |
/// |-----|-------------|------------------|----------|
/// | 1   | `sourceURL` | UTF-8            | yes      |
/// | 2   | `magnet`    | UTF-8            | yes      |
/// | 3   | `title`     | UTF-8            | no       |
/// | 4   | `addedBy`   | UTF-8            | no       |
/// | 5   | `preview`   | UTF-8            | no       |
/// | 6   | `timestamp` | i64, len = 8     | yes      |
///
/// The encoder always writes all six fields in tag order, so equal entries
/// produce equal bytes. The decoder requires strictly increasing tags (tag 0
/// is reserved), skips tags it does not know, and fills missing optional
/// fields with `""`. A catalog snapshot is `[count: 4][frame]*`.
use thiserror::Error;

use crate::crdt::entry::Entry;
use crate::crdt::limits::{
    field_within_limit, is_supported_version, MAX_ENTRIES_PER_BATCH, MAX_ENTRY_BODY_BYTES,
    MAX_FIELD_BYTES, SCHEMA_VERSION,
};

/// Schema marker at the start of every frame.
pub const MAGIC: [u8; 2] = *b"WC";
/// Frame header size: magic(2) + version(1) + body_len(4)
pub const HEADER_SIZE: usize = 7;
/// Field header size: tag(1) + len(4)
pub const FIELD_HEADER_SIZE: usize = 5;
/// Snapshot header size: count(4)
pub const BATCH_HEADER_SIZE: usize = 4;

const TIMESTAMP_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Every decode failure means the input was malformed; the variant says how.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Input truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Bad schema marker: {0:02x?}")]
    BadMagic([u8; 2]),

    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(u8),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("Field {field} has length {actual}, expected {expected}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Field tag {tag} follows tag {previous}; tags must be strictly increasing")]
    FieldOrder { tag: u8, previous: u8 },

    #[error("{0} unexpected bytes after the declared frame")]
    TrailingBytes(usize),

    #[error("Field {field} is {size} bytes (max {max})")]
    FieldTooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    #[error("Frame body is {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Snapshot holds {count} entries (max {max})")]
    BatchTooLarge { count: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

// ---------------------------------------------------------------------------
// Field tags
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldTag {
    SourceUrl = 1,
    Magnet = 2,
    Title = 3,
    AddedBy = 4,
    Preview = 5,
    Timestamp = 6,
}

impl FieldTag {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::SourceUrl),
            2 => Some(Self::Magnet),
            3 => Some(Self::Title),
            4 => Some(Self::AddedBy),
            5 => Some(Self::Preview),
            6 => Some(Self::Timestamp),
            _ => None,
        }
    }

    /// Host-facing field name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SourceUrl => "sourceURL",
            Self::Magnet => "magnet",
            Self::Title => "title",
            Self::AddedBy => "addedBy",
            Self::Preview => "preview",
            Self::Timestamp => "timestamp",
        }
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode one entry into a self-delimiting frame.
///
/// Fails only when a string field exceeds [`MAX_FIELD_BYTES`].
pub fn encode(entry: &Entry) -> Result<Vec<u8>> {
    let strings = [
        (FieldTag::SourceUrl, entry.source_url.as_bytes()),
        (FieldTag::Magnet, entry.magnet.as_bytes()),
        (FieldTag::Title, entry.title.as_bytes()),
        (FieldTag::AddedBy, entry.added_by.as_bytes()),
        (FieldTag::Preview, entry.preview.as_bytes()),
    ];

    let mut body_len = FIELD_HEADER_SIZE + TIMESTAMP_LEN;
    for (tag, value) in &strings {
        if !field_within_limit(value.len()) {
            return Err(CodecError::FieldTooLarge {
                field: tag.name(),
                size: value.len(),
                max: MAX_FIELD_BYTES,
            });
        }
        body_len += FIELD_HEADER_SIZE + value.len();
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + body_len);
    buf.extend_from_slice(&MAGIC);
    buf.push(SCHEMA_VERSION);
    buf.extend_from_slice(&(body_len as u32).to_be_bytes());

    for (tag, value) in strings {
        put_field(&mut buf, tag, value);
    }
    put_field(&mut buf, FieldTag::Timestamp, &entry.timestamp.to_be_bytes());

    debug_assert_eq!(buf.len(), HEADER_SIZE + body_len);
    Ok(buf)
}

fn put_field(buf: &mut Vec<u8>, tag: FieldTag, value: &[u8]) {
    buf.push(tag as u8);
    buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
    buf.extend_from_slice(value);
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Parse the frame header. Returns `(version, body_len)`.
fn read_header(bytes: &[u8]) -> Result<(u8, usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::Truncated {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let magic = [bytes[0], bytes[1]];
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }

    let version = bytes[2];
    if !is_supported_version(version) {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let body_len = read_u32(&bytes[3..HEADER_SIZE]);
    if body_len > MAX_ENTRY_BODY_BYTES {
        return Err(CodecError::FrameTooLarge {
            size: body_len,
            max: MAX_ENTRY_BODY_BYTES,
        });
    }

    Ok((version, body_len))
}

/// Length of the frame at the start of `bytes`, read from its header only.
pub fn encoded_len(bytes: &[u8]) -> Result<usize> {
    let (_, body_len) = read_header(bytes)?;
    Ok(HEADER_SIZE + body_len)
}

/// Decode exactly one frame. Bytes past the declared body are an error.
pub fn decode(bytes: &[u8]) -> Result<Entry> {
    let frame_len = encoded_len(bytes)?;
    if bytes.len() < frame_len {
        return Err(CodecError::Truncated {
            needed: frame_len,
            available: bytes.len(),
        });
    }
    if bytes.len() > frame_len {
        return Err(CodecError::TrailingBytes(bytes.len() - frame_len));
    }
    decode_body(&bytes[HEADER_SIZE..frame_len])
}

fn decode_body(body: &[u8]) -> Result<Entry> {
    let mut source_url = None;
    let mut magnet = None;
    let mut title = None;
    let mut added_by = None;
    let mut preview = None;
    let mut timestamp = None;

    let mut offset = 0;
    let mut previous = 0u8;

    while offset < body.len() {
        if body.len() - offset < FIELD_HEADER_SIZE {
            return Err(CodecError::Truncated {
                needed: HEADER_SIZE + offset + FIELD_HEADER_SIZE,
                available: HEADER_SIZE + body.len(),
            });
        }

        let tag = body[offset];
        let len = read_u32(&body[offset + 1..offset + FIELD_HEADER_SIZE]);
        offset += FIELD_HEADER_SIZE;

        if tag <= previous {
            return Err(CodecError::FieldOrder { tag, previous });
        }
        previous = tag;

        if len > body.len() - offset {
            // `len` comes off the wire and may be close to `u32::MAX`.
            return Err(CodecError::Truncated {
                needed: (HEADER_SIZE + offset).saturating_add(len),
                available: HEADER_SIZE + body.len(),
            });
        }
        let value = &body[offset..offset + len];
        offset += len;

        let Some(field) = FieldTag::from_u8(tag) else {
            // Added by a newer schema version.
            continue;
        };

        match field {
            FieldTag::SourceUrl => source_url = Some(read_text(field, value)?),
            FieldTag::Magnet => magnet = Some(read_text(field, value)?),
            FieldTag::Title => title = Some(read_text(field, value)?),
            FieldTag::AddedBy => added_by = Some(read_text(field, value)?),
            FieldTag::Preview => preview = Some(read_text(field, value)?),
            FieldTag::Timestamp => timestamp = Some(read_timestamp(value)?),
        }
    }

    Ok(Entry {
        source_url: source_url.ok_or(CodecError::MissingField(FieldTag::SourceUrl.name()))?,
        magnet: magnet.ok_or(CodecError::MissingField(FieldTag::Magnet.name()))?,
        title: title.unwrap_or_default(),
        added_by: added_by.unwrap_or_default(),
        preview: preview.unwrap_or_default(),
        timestamp: timestamp.ok_or(CodecError::MissingField(FieldTag::Timestamp.name()))?,
    })
}

fn read_text(field: FieldTag, value: &[u8]) -> Result<String> {
    if !field_within_limit(value.len()) {
        return Err(CodecError::FieldTooLarge {
            field: field.name(),
            size: value.len(),
            max: MAX_FIELD_BYTES,
        });
    }
    std::str::from_utf8(value)
        .map(str::to_owned)
        .map_err(|_| CodecError::InvalidUtf8(field.name()))
}

fn read_timestamp(value: &[u8]) -> Result<i64> {
    if value.len() != TIMESTAMP_LEN {
        return Err(CodecError::InvalidFieldLength {
            field: FieldTag::Timestamp.name(),
            expected: TIMESTAMP_LEN,
            actual: value.len(),
        });
    }
    let mut raw = [0u8; TIMESTAMP_LEN];
    raw.copy_from_slice(value);
    Ok(i64::from_be_bytes(raw))
}

fn read_u32(bytes: &[u8]) -> usize {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(raw) as usize
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Encode many entries as `[count][frame]*`, in iteration order.
pub fn encode_batch<'a, I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut count = 0usize;
    let mut frames = Vec::new();
    for entry in entries {
        count += 1;
        if count > MAX_ENTRIES_PER_BATCH {
            return Err(CodecError::BatchTooLarge {
                count,
                max: MAX_ENTRIES_PER_BATCH,
            });
        }
        frames.extend_from_slice(&encode(entry)?);
    }

    let mut buf = Vec::with_capacity(BATCH_HEADER_SIZE + frames.len());
    buf.extend_from_slice(&(count as u32).to_be_bytes());
    buf.extend_from_slice(&frames);
    Ok(buf)
}

/// Decode a snapshot produced by [`encode_batch`].
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Entry>> {
    if bytes.len() < BATCH_HEADER_SIZE {
        return Err(CodecError::Truncated {
            needed: BATCH_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let count = read_u32(bytes);
    if count > MAX_ENTRIES_PER_BATCH {
        return Err(CodecError::BatchTooLarge {
            count,
            max: MAX_ENTRIES_PER_BATCH,
        });
    }

    let mut entries = Vec::with_capacity(count.min(1024));
    let mut offset = BATCH_HEADER_SIZE;
    for _ in 0..count {
        let rest = &bytes[offset..];
        let frame_len = encoded_len(rest)?;
        if rest.len() < frame_len {
            return Err(CodecError::Truncated {
                needed: offset.saturating_add(frame_len),
                available: bytes.len(),
            });
        }
        entries.push(decode(&rest[..frame_len])?);
        offset += frame_len;
    }

    if offset != bytes.len() {
        return Err(CodecError::TrailingBytes(bytes.len() - offset));
    }
    Ok(entries)
}

impl Entry {
    /// Serialize for storage / wire transfer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Deserialize a single frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn full_entry() -> Entry {
        Entry::new("https://forum.example/t/big-buck-bunny/42", "magnet:?xt=urn:btih:dd82", 1_700_000_000_123)
            .with_title("Big Buck Bunny")
            .with_added_by("alice")
            .with_preview("data:image/png;base64,iVBORw0KGgo=")
    }

    /// Build a frame from raw `(tag, value)` fields.
    fn frame(fields: &[(u8, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (tag, value) in fields {
            body.push(*tag);
            body.extend_from_slice(&(value.len() as u32).to_be_bytes());
            body.extend_from_slice(value);
        }
        let mut buf = MAGIC.to_vec();
        buf.push(SCHEMA_VERSION);
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(&body);
        buf
    }

    #[test]
    fn test_golden_vector() {
        let entry = Entry::new("u", "m", 1).with_title("t");
        let expected = hex!(
            "5743 01 00000029"
            "01 00000001 75"
            "02 00000001 6d"
            "03 00000001 74"
            "04 00000000"
            "05 00000000"
            "06 00000008 0000000000000001"
        );
        assert_eq!(encode(&entry).unwrap(), expected.to_vec());
        assert_eq!(decode(&expected).unwrap(), entry);
    }

    #[test]
    fn test_roundtrip_full_entry() {
        let entry = full_entry();
        let bytes = entry.to_bytes().unwrap();
        assert_eq!(Entry::from_bytes(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_roundtrip_empty_optionals() {
        let entry = Entry::new("k", "m", 0);
        let decoded = decode(&encode(&entry).unwrap()).unwrap();
        assert_eq!(decoded.title, "");
        assert_eq!(decoded.added_by, "");
        assert_eq!(decoded.preview, "");
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_roundtrip_extreme_timestamps() {
        for ts in [i64::MIN, -1, 0, i64::MAX] {
            let entry = Entry::new("k", "m", ts);
            assert_eq!(decode(&encode(&entry).unwrap()).unwrap().timestamp, ts);
        }
    }

    #[test]
    fn test_encoded_len_matches_buffer() {
        let bytes = encode(&full_entry()).unwrap();
        assert_eq!(encoded_len(&bytes).unwrap(), bytes.len());
        // Header alone is enough to answer.
        assert_eq!(encoded_len(&bytes[..HEADER_SIZE]).unwrap(), bytes.len());
    }

    #[test]
    fn test_every_prefix_is_rejected() {
        let bytes = encode(&full_entry()).unwrap();
        for cut in 0..bytes.len() {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, CodecError::Truncated { .. }),
                "prefix {} gave {:?}",
                cut,
                err
            );
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&full_entry()).unwrap();
        bytes[0] = b'X';
        assert_eq!(decode(&bytes), Err(CodecError::BadMagic([b'X', b'C'])));
        assert_eq!(encoded_len(&bytes), Err(CodecError::BadMagic([b'X', b'C'])));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode(&full_entry()).unwrap();
        bytes[2] = SCHEMA_VERSION + 1;
        assert_eq!(
            decode(&bytes),
            Err(CodecError::UnsupportedVersion(SCHEMA_VERSION + 1))
        );
        bytes[2] = 0;
        assert_eq!(decode(&bytes), Err(CodecError::UnsupportedVersion(0)));
    }

    #[test]
    fn test_missing_required_fields() {
        let ts = 5i64.to_be_bytes();
        let no_url = frame(&[(2, b"m"), (6, &ts)]);
        assert_eq!(decode(&no_url), Err(CodecError::MissingField("sourceURL")));

        let no_magnet = frame(&[(1, b"u"), (6, &ts)]);
        assert_eq!(decode(&no_magnet), Err(CodecError::MissingField("magnet")));

        let no_ts = frame(&[(1, b"u"), (2, b"m"), (3, b"t")]);
        assert_eq!(decode(&no_ts), Err(CodecError::MissingField("timestamp")));
    }

    #[test]
    fn test_absent_optionals_decode_empty() {
        let ts = 9i64.to_be_bytes();
        let bytes = frame(&[(1, b"u"), (2, b"m"), (6, &ts)]);
        assert_eq!(decode(&bytes).unwrap(), Entry::new("u", "m", 9));
    }

    #[test]
    fn test_unknown_tags_are_skipped() {
        let ts = 9i64.to_be_bytes();
        let bytes = frame(&[(1, b"u"), (2, b"m"), (6, &ts), (7, b"future"), (200, b"")]);
        assert_eq!(decode(&bytes).unwrap(), Entry::new("u", "m", 9));
    }

    #[test]
    fn test_out_of_order_tags() {
        let ts = 9i64.to_be_bytes();
        let swapped = frame(&[(2, b"m"), (1, b"u"), (6, &ts)]);
        assert_eq!(
            decode(&swapped),
            Err(CodecError::FieldOrder { tag: 1, previous: 2 })
        );

        let duplicate = frame(&[(1, b"u"), (1, b"v"), (2, b"m"), (6, &ts)]);
        assert_eq!(
            decode(&duplicate),
            Err(CodecError::FieldOrder { tag: 1, previous: 1 })
        );

        let reserved = frame(&[(0, b""), (1, b"u"), (2, b"m"), (6, &ts)]);
        assert_eq!(
            decode(&reserved),
            Err(CodecError::FieldOrder { tag: 0, previous: 0 })
        );
    }

    #[test]
    fn test_bad_timestamp_length() {
        let bytes = frame(&[(1, b"u"), (2, b"m"), (6, &[0, 1, 2, 3])]);
        assert_eq!(
            decode(&bytes),
            Err(CodecError::InvalidFieldLength {
                field: "timestamp",
                expected: 8,
                actual: 4
            })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let ts = 1i64.to_be_bytes();
        let bytes = frame(&[(1, b"u"), (2, &[0xC3, 0x28]), (6, &ts)]);
        assert_eq!(decode(&bytes), Err(CodecError::InvalidUtf8("magnet")));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&full_entry()).unwrap();
        bytes.extend_from_slice(&[0, 0, 0]);
        assert_eq!(decode(&bytes), Err(CodecError::TrailingBytes(3)));
    }

    #[test]
    fn test_declared_body_too_large() {
        let mut bytes = MAGIC.to_vec();
        bytes.push(SCHEMA_VERSION);
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_oversized_field_length_is_truncated() {
        let mut body = vec![1u8];
        body.extend_from_slice(&u32::MAX.to_be_bytes());
        let mut bytes = MAGIC.to_vec();
        bytes.push(SCHEMA_VERSION);
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);

        match decode(&bytes) {
            Err(CodecError::Truncated { needed, available }) => {
                assert_eq!(available, bytes.len());
                assert!(needed >= u32::MAX as usize);
            }
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_field_too_large_on_encode() {
        let entry = Entry::new("u", "m", 1).with_preview("x".repeat(MAX_FIELD_BYTES + 1));
        assert_eq!(
            encode(&entry),
            Err(CodecError::FieldTooLarge {
                field: "preview",
                size: MAX_FIELD_BYTES + 1,
                max: MAX_FIELD_BYTES
            })
        );
    }

    #[test]
    fn test_equal_entries_encode_equal() {
        assert_eq!(encode(&full_entry()).unwrap(), encode(&full_entry()).unwrap());
    }

    #[test]
    fn test_batch_roundtrip() {
        let entries = vec![
            full_entry(),
            Entry::new("k2", "m2", 2),
            Entry::new("k3", "m3", -3).with_title("three"),
        ];
        let bytes = encode_batch(&entries).unwrap();
        assert_eq!(decode_batch(&bytes).unwrap(), entries);
    }

    #[test]
    fn test_empty_batch() {
        let bytes = encode_batch(std::iter::empty()).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert!(decode_batch(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_batch_truncated_and_trailing() {
        let entries = vec![Entry::new("a", "m", 1), Entry::new("b", "m", 2)];
        let bytes = encode_batch(&entries).unwrap();

        assert!(matches!(
            decode_batch(&bytes[..bytes.len() - 1]),
            Err(CodecError::Truncated { .. })
        ));

        let mut extra = bytes.clone();
        extra.push(0xAA);
        assert_eq!(decode_batch(&extra), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn test_batch_count_limit() {
        let bytes = ((MAX_ENTRIES_PER_BATCH + 1) as u32).to_be_bytes();
        assert!(matches!(
            decode_batch(&bytes),
            Err(CodecError::BatchTooLarge { .. })
        ));
    }

    #[test]
    fn test_field_tag_names() {
        for v in 1..=6 {
            let tag = FieldTag::from_u8(v).unwrap();
            assert_eq!(tag as u8, v);
            assert!(!tag.name().is_empty());
        }
        assert_eq!(FieldTag::from_u8(0), None);
        assert_eq!(FieldTag::from_u8(7), None);
    }
}
