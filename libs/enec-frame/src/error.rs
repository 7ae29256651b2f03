//! Error types for frame decoding

use thiserror::Error;

/// Errors produced while delimiting, decoding, or extracting a telemetry frame
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame payload is not valid URL-safe base64
    #[error("Payload decode error: {0}")]
    PayloadDecode(#[from] base64::DecodeError),

    /// The decoded digest does not cover every field offset
    #[error("Digest too short: {len} characters, {required} required")]
    DigestTooShort { len: usize, required: usize },

    /// A field slice did not parse as base-16
    #[error("Field {field} is not valid hex: {value:?}")]
    FieldParse {
        field: &'static str,
        value: String,
    },

    /// The byte stream exceeded the frame length limit without a terminator
    #[error("Frame exceeds {limit} bytes without terminator")]
    FrameTooLong { limit: usize },

    /// Underlying socket read failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameError::DigestTooShort {
            len: 10,
            required: 74,
        };
        assert_eq!(
            err.to_string(),
            "Digest too short: 10 characters, 74 required"
        );

        let err = FrameError::FieldParse {
            field: "time1",
            value: "zzzz".to_string(),
        };
        assert!(err.to_string().contains("time1"));
        assert!(err.to_string().contains("zzzz"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: FrameError = io_err.into();
        assert!(matches!(err, FrameError::Io(_)));
    }
}
