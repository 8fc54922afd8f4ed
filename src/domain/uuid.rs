//! 16-byte copy identifiers and their canonical text form.
//!
//! Text form is the usual 8-4-4-4-12 lowercase hex layout, e.g.
//! `d99d53e1-b67c-438b-8420-2bd9a1e3c1f0`. Encoding and decoding work on
//! fixed-size stack buffers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of raw bytes
pub const UUID_LEN: usize = 16;

/// Length of the hyphenated text form
pub const UUID_TEXT_LEN: usize = 36;

/// Offsets of the hyphens in the text form
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Source of fresh random bytes for new identifiers
pub trait EntropySource: Send + Sync {
    /// Produce 16 fresh, independent random bytes
    fn next_bytes(&self) -> [u8; UUID_LEN];
}

/// Operating-system randomness, via the `uuid` crate's v4 generator.
///
/// Version and variant bits are set per RFC 4122, leaving 122 random bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_bytes(&self) -> [u8; UUID_LEN] {
        ::uuid::Uuid::new_v4().into_bytes()
    }
}

/// Text that does not follow the canonical hyphenated layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid UUID: expected 36 characters in 8-4-4-4-12 hex form")]
pub struct InvalidUuid;

/// Opaque 16-byte identifier of a physical copy
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uuid {
    bytes: [u8; UUID_LEN],
}

impl Uuid {
    /// Mint a new identifier from operating-system randomness
    pub fn generate() -> Self {
        Self::generate_from(&OsEntropy)
    }

    /// Mint a new identifier from the given entropy source
    pub fn generate_from(entropy: &dyn EntropySource) -> Self {
        Self::from_bytes(entropy.next_bytes())
    }

    /// Wrap 16 bytes verbatim
    pub const fn from_bytes(bytes: [u8; UUID_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; UUID_LEN] {
        &self.bytes
    }

    /// Encode to the 36-character canonical form
    pub fn serialize(&self) -> UuidText {
        let mut text = [b'-'; UUID_TEXT_LEN];
        let mut pos = 0;

        for byte in self.bytes {
            if HYPHENS.contains(&pos) {
                pos += 1;
            }
            text[pos] = HEX[usize::from(byte >> 4)];
            text[pos + 1] = HEX[usize::from(byte & 0x0f)];
            pos += 2;
        }

        UuidText { text }
    }

    /// Decode the canonical form.
    ///
    /// Returns `None` unless `text` is exactly 36 characters with hyphens at
    /// positions 8, 13, 18 and 23 and hex digits everywhere else. Upper-case
    /// hex digits are accepted.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.as_bytes();
        if text.len() != UUID_TEXT_LEN {
            return None;
        }

        let mut bytes = [0u8; UUID_LEN];
        let mut pos = 0;

        for byte in bytes.iter_mut() {
            if HYPHENS.contains(&pos) {
                if text[pos] != b'-' {
                    return None;
                }
                pos += 1;
            }
            let hi = hex_value(text[pos])?;
            let lo = hex_value(text[pos + 1])?;
            *byte = (hi << 4) | lo;
            pos += 2;
        }

        Some(Self { bytes })
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.serialize().as_str())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uuid({})", self.serialize().as_str())
    }
}

impl FromStr for Uuid {
    type Err = InvalidUuid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(InvalidUuid)
    }
}

impl TryFrom<String> for Uuid {
    type Error = InvalidUuid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Uuid> for String {
    fn from(uuid: Uuid) -> Self {
        uuid.serialize().as_str().to_string()
    }
}

/// Stack-allocated canonical text of a [`Uuid`]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UuidText {
    text: [u8; UUID_TEXT_LEN],
}

impl UuidText {
    pub fn as_str(&self) -> &str {
        // Built exclusively from ASCII hex digits and hyphens.
        std::str::from_utf8(&self.text).unwrap_or_default()
    }
}

impl fmt::Display for UuidText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for UuidText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
