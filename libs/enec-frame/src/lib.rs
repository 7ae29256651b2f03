//! Enecsys micro-inverter telemetry decoding
//!
//! This crate turns the byte stream an Enecsys gateway writes to a TCP
//! socket into typed metric samples. The pipeline has five pure
//! stages, each usable on its own:
//!
//! 1. [`FrameCodec`] delimits the stream on carriage returns
//! 2. [`TelemetryFrame::classify`] keeps only telemetry frames
//! 3. [`decode_payload`] unwraps the base64url payload into a hex digest
//! 4. [`extract`] reads the raw channels at fixed digest offsets
//! 5. [`derive`] and [`sample_set`] produce the named samples
//!
//! Nothing here does IO beyond the codec trait bounds; servers and
//! sinks live in the service crate.

pub mod codec;
pub mod derive;
pub mod digest;
pub mod error;
pub mod fields;
pub mod frame;
pub mod sample;

pub use codec::{FrameCodec, DEFAULT_MAX_FRAME_LEN};
pub use derive::{derive, DerivedFieldSet, DC_CURRENT_SCALE, EFFICIENCY_SCALE};
pub use digest::{decode_payload, Digest};
pub use error::{FrameError, Result};
pub use fields::{extract, RawField, RawFieldSet, MIN_DIGEST_LEN};
pub use frame::{
    TelemetryFrame, FRAME_LEN, FRAME_TERMINATOR, MARKER, MARKER_END, MARKER_START, PAYLOAD_START,
};
pub use sample::{format_value, sample_set, Metric};
