//! Nested payload decode
//!
//! The payload region of a telemetry frame is URL-safe base64 without
//! padding. The decoded bytes are not used directly; they are rendered
//! as a lowercase hex string and every field is addressed by character
//! offset into that string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::{FrameError, Result};

/// Lowercase hex rendering of a decoded frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(String);

impl Digest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for Digest {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decode a frame payload into its hex digest
pub fn decode_payload(payload: &[u8]) -> Result<Digest> {
    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(FrameError::from)?;
    Ok(Digest(hex::encode(bytes)))
}
