//! Fixed-width ISBN identifier.
//!
//! An ISBN is stored inline as up to 13 ASCII digits followed by a NUL
//! terminator in a 14-byte buffer. Unused trailing bytes are always zero, so
//! equality, ordering and hashing can operate on the whole buffer.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the inline buffer (13 digits + terminator)
const BUFFER_SIZE: usize = 14;

/// Terminator written after the last digit
const SENTINEL: u8 = 0;

/// Seed of the djb2 hash
const DJB2_SEED: u64 = 5381;

/// Reasons an ISBN string is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IsbnError {
    #[error("ISBN must be exactly 10 or 13 characters long")]
    InvalidLength,

    #[error("ISBN may only contain the digits 0-9")]
    InvalidChar,
}

/// A validated 10- or 13-digit ISBN.
///
/// No checksum validation is performed: only length and character set are
/// enforced.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn {
    buffer: [u8; BUFFER_SIZE],
}

impl Isbn {
    /// Parse and validate an ISBN.
    ///
    /// Length is checked before characters, so `"abc"` reports
    /// [`IsbnError::InvalidLength`] rather than [`IsbnError::InvalidChar`].
    pub fn parse(text: &str) -> Result<Self, IsbnError> {
        let bytes = text.as_bytes();
        if bytes.len() != 10 && bytes.len() != 13 {
            return Err(IsbnError::InvalidLength);
        }

        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(IsbnError::InvalidChar);
        }

        let mut buffer = [SENTINEL; BUFFER_SIZE];
        buffer[..bytes.len()].copy_from_slice(bytes);

        Ok(Self { buffer })
    }

    /// Number of digits (10 or 13)
    pub fn len(&self) -> usize {
        self.buffer
            .iter()
            .position(|&b| b == SENTINEL)
            .unwrap_or(BUFFER_SIZE)
    }

    /// Always false for a constructed ISBN
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the digits up to the terminator
    pub fn as_str(&self) -> &str {
        // Only ASCII digits are ever written before the terminator.
        std::str::from_utf8(&self.buffer[..self.len()]).unwrap_or_default()
    }

    /// The full fixed buffer, including the terminator and zero padding
    pub fn as_bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    /// djb2 hash (`h = h * 33 + byte`) over every byte of the fixed buffer
    pub fn djb2(&self) -> u64 {
        self.buffer.iter().fold(DJB2_SEED, |hash, &byte| {
            (hash << 5).wrapping_add(hash).wrapping_add(u64::from(byte))
        })
    }
}

impl Hash for Isbn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.djb2());
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Debug for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Isbn({})", self.as_str())
    }
}

impl FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isbn {
    type Error = IsbnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.as_str().to_string()
    }
}
