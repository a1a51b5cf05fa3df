/// Content identity hashing with 32-bit FNV-1a.
///
/// Every peer derives the same identifier from the same bytes, on any platform:
/// the accumulator is a plain `u32`, bytes are fed in order as unsigned values,
/// and all arithmetic wraps modulo 2^32.
///
/// ```text
/// acc = 0x811C9DC5
/// for b in input: acc = (acc ^ b) * 0x01000193
/// ```
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 32-bit FNV offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;

/// 32-bit FNV prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Width of the canonical hex form (4 bytes → 8 digits).
pub const CONTENT_ID_LEN: usize = 8;

#[derive(Error, Debug, PartialEq)]
pub enum HashError {
    #[error("Content id must be {CONTENT_ID_LEN} hex digits, got {0}")]
    InvalidLength(usize),
    #[error("Content id is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, HashError>;

// ---------------------------------------------------------------------------
// Incremental hasher
// ---------------------------------------------------------------------------

/// Streaming FNV-1a state.
///
/// Feeding input in several `update` calls yields the same value as hashing
/// the concatenation at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a {
    state: u32,
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a {
    pub fn new() -> Self {
        Fnv1a {
            state: FNV_OFFSET_BASIS,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        for &byte in bytes {
            self.state ^= u32::from(byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
        self
    }

    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state)
    }
}

// ---------------------------------------------------------------------------
// ContentHash
// ---------------------------------------------------------------------------

/// A 32-bit content hash. Displays as 8 lowercase, zero-padded hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash(pub u32);

impl ContentHash {
    /// Hash raw bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Fnv1a::new().update(bytes).finish()
    }

    /// Hash the UTF-8 bytes of a string.
    pub fn of_str(text: &str) -> Self {
        Self::of_bytes(text.as_bytes())
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Canonical hex form, always [`CONTENT_ID_LEN`] characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }

    /// Parse the canonical hex form back into a hash.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != CONTENT_ID_LEN {
            return Err(HashError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 4];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(ContentHash(u32::from_be_bytes(bytes)))
    }
}

impl From<ContentHash> for u32 {
    fn from(hash: ContentHash) -> u32 {
        hash.0
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self> {
        ContentHash::from_hex(s)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Free functions (host-facing names)
// ---------------------------------------------------------------------------

/// FNV-1a over the bytes of `text`.
pub fn hash_string(text: &str) -> u32 {
    ContentHash::of_str(text).0
}

/// Render a hash as 8 lowercase hex digits.
pub fn hash_to_hex(hash: u32) -> String {
    ContentHash(hash).to_hex()
}

/// `hash_to_hex(hash_string(text))`.
pub fn content_id(text: &str) -> String {
    ContentHash::of_str(text).to_hex()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        assert_eq!(hash_string(""), 0x811c_9dc5);
        assert_eq!(hash_string("a"), 0xe40c_292c);
        assert_eq!(hash_string("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_empty_content_id() {
        assert_eq!(content_id(""), "811c9dc5");
    }

    #[test]
    fn test_hex_is_zero_padded() {
        assert_eq!(hash_to_hex(0), "00000000");
        assert_eq!(hash_to_hex(0xab), "000000ab");
        assert_eq!(hash_to_hex(u32::MAX), "ffffffff");
    }

    #[test]
    fn test_content_id_shape() {
        for input in ["", "x", "https://example.org/t/some-topic/42", "ünïcödé ✓"] {
            let id = content_id(input);
            assert_eq!(id.len(), CONTENT_ID_LEN);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(hash_string("ab"), hash_string("ba"));
    }

    #[test]
    fn test_high_bytes_use_unsigned_value() {
        // 0xFF must be XORed as 255, not sign-extended.
        let mut expected = FNV_OFFSET_BASIS;
        expected ^= 0xFF;
        expected = expected.wrapping_mul(FNV_PRIME);
        assert_eq!(ContentHash::of_bytes(&[0xFF]).0, expected);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Fnv1a::new();
        hasher.update(b"magnet:?xt=");
        hasher.update(b"urn:btih:abc");
        assert_eq!(
            hasher.finish(),
            ContentHash::of_bytes(b"magnet:?xt=urn:btih:abc")
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = ContentHash::of_str("https://example.org/a");
        let parsed: ContentHash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(
            ContentHash::from_hex("abc"),
            Err(HashError::InvalidLength(3))
        );
        assert!(matches!(
            ContentHash::from_hex("zzzzzzzz"),
            Err(HashError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_display_matches_hex() {
        let hash = ContentHash(0x0012_abcd);
        assert_eq!(hash.to_string(), "0012abcd");
        assert_eq!(format!("{:?}", hash), "ContentHash(0012abcd)");
    }
}
