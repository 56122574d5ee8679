//! Profile photo handling.
//!
//! The backend transports profile photos as base64-encoded JPEG strings
//! embedded directly in JSON payloads. [`ProfilePhoto`] is the only place in
//! the crate that touches base64: callers hand it raw bytes (or the wire
//! string) and get validation, and the serde impls put the encoded form on
//! the wire.

use std::fmt;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Upper bound for an encoded profile photo.
pub const MAX_PHOTO_BYTES: usize = 8 * 1024 * 1024;

/// JPEG start-of-image marker.
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhotoError {
    #[error("Photo is empty")]
    Empty,
    #[error("Photo is not a JPEG image")]
    NotJpeg,
    #[error("Photo is {actual} bytes; the limit is {limit} bytes")]
    TooLarge { actual: usize, limit: usize },
    #[error("Photo payload is not valid base64: {0}")]
    InvalidBase64(String),
}

pub type PhotoResult<T> = std::result::Result<T, PhotoError>;

/// A validated JPEG profile photo.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfilePhoto {
    bytes: Vec<u8>,
}

impl ProfilePhoto {
    /// Validate raw image bytes: non-empty, JPEG magic, within the size cap.
    pub fn from_bytes(bytes: Vec<u8>) -> PhotoResult<Self> {
        if bytes.is_empty() {
            return Err(PhotoError::Empty);
        }
        if bytes.len() < JPEG_MAGIC.len() || bytes[..JPEG_MAGIC.len()] != JPEG_MAGIC {
            return Err(PhotoError::NotJpeg);
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge {
                actual: bytes.len(),
                limit: MAX_PHOTO_BYTES,
            });
        }
        Ok(Self { bytes })
    }

    /// Decode the wire form (a base64 string) and validate the result.
    pub fn from_base64(encoded: &str) -> PhotoResult<Self> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(PhotoError::Empty);
        }
        let bytes = BASE64_STANDARD
            .decode(trimmed)
            .map_err(|error| PhotoError::InvalidBase64(error.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Encoded form for embedding in a JSON payload.
    #[must_use]
    pub fn as_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// A photo can run to megabytes; keep Debug output to its size.
impl fmt::Debug for ProfilePhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProfilePhoto({} bytes)", self.bytes.len())
    }
}

impl Serialize for ProfilePhoto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_base64())
    }
}

impl<'de> Deserialize<'de> for ProfilePhoto {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_base64(&raw).map_err(serde::de::Error::custom)
    }
}
