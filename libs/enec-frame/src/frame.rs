//! Telemetry frame layout and classification
//!
//! Inverter gateways emit ASCII frames terminated by a carriage return.
//! Only one frame shape carries telemetry: exactly [`FRAME_LEN`] bytes
//! with the [`MARKER`] tag at a fixed offset. Everything else on the
//! stream (status lines, boot banners) is ignored.

/// Length of a telemetry frame in bytes, terminator excluded
pub const FRAME_LEN: usize = 77;

/// Byte that terminates every frame on the wire
pub const FRAME_TERMINATOR: u8 = 0x0D;

/// Tag identifying a telemetry frame
pub const MARKER: &[u8] = b"WS";

/// Offset of the first marker byte
pub const MARKER_START: usize = 18;

/// Offset one past the last marker byte
pub const MARKER_END: usize = 20;

/// Offset of the first payload byte
pub const PAYLOAD_START: usize = 21;

/// A delimited frame classified as telemetry
///
/// Borrowing wrapper over the raw bytes of one frame. Construction via
/// [`TelemetryFrame::classify`] guarantees length and marker, so the
/// payload accessor never panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryFrame<'a> {
    raw: &'a [u8],
}

impl<'a> TelemetryFrame<'a> {
    /// Classify a delimited frame, returning `None` for non-telemetry frames
    pub fn classify(raw: &'a [u8]) -> Option<Self> {
        if raw.len() != FRAME_LEN {
            return None;
        }
        if &raw[MARKER_START..MARKER_END] != MARKER {
            return None;
        }
        Some(Self { raw })
    }

    /// The encoded payload region of the frame
    pub fn payload(&self) -> &'a [u8] {
        &self.raw[PAYLOAD_START..]
    }

    /// The full frame bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }
}
