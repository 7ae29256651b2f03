//! Carriage-return frame delimiter for the gateway byte stream

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::FrameError;
use crate::frame::FRAME_TERMINATOR;

/// Upper bound on buffered bytes while waiting for a terminator
pub const DEFAULT_MAX_FRAME_LEN: usize = 4096;

/// Splits a TCP stream into frames on the carriage-return terminator
///
/// The terminator is stripped from every emitted frame. Frames are
/// emitted regardless of content; classification happens afterwards.
/// A stream that never produces a terminator is aborted once the
/// buffer exceeds the configured limit. Bytes left after EOF do not
/// form a complete frame and are discarded.
#[derive(Debug)]
pub struct FrameCodec {
    // Scan resume point, so repeated decode calls stay linear.
    next_index: usize,
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            next_index: 0,
            max_frame_len,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        if let Some(pos) = src[self.next_index..]
            .iter()
            .position(|&b| b == FRAME_TERMINATOR)
        {
            let end = self.next_index + pos;
            let frame = src.split_to(end).freeze();
            src.advance(1);
            self.next_index = 0;
            Ok(Some(frame))
        } else if src.len() > self.max_frame_len {
            Err(FrameError::FrameTooLong {
                limit: self.max_frame_len,
            })
        } else {
            self.next_index = src.len();
            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        // Trailing bytes without a terminator are an incomplete frame.
        src.clear();
        self.next_index = 0;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut FrameCodec, buf: &mut BytesMut) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_splits_on_terminator() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"alpha\rbeta\r"[..]);
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames, vec![Bytes::from("alpha"), Bytes::from("beta")]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_terminator_not_included() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"frame\r"[..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Bytes::from("frame"));
        assert!(!frame.contains(&FRAME_TERMINATOR));
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"incompl"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"ete\r");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Bytes::from("incomplete"));
    }

    #[test]
    fn test_empty_frames_are_emitted() {
        // Back-to-back terminators yield zero-length frames; the
        // classifier drops them later on length.
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"\r\rx\r"[..]);
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_empty());
        assert!(frames[1].is_empty());
        assert_eq!(frames[2], Bytes::from("x"));
    }

    #[test]
    fn test_oversize_without_terminator_errors() {
        let mut codec = FrameCodec::with_max_frame_len(16);
        let mut buf = BytesMut::from(&[b'a'; 17][..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLong { limit: 16 }));
    }

    #[test]
    fn test_oversize_limit_is_exclusive() {
        let mut codec = FrameCodec::with_max_frame_len(16);
        let mut buf = BytesMut::from(&[b'a'; 16][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_eof_discards_partial_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"full\rdangling"[..]);
        let frame = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Bytes::from("full"));
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_scan_resumes_after_partial_read() {
        // Feeding one byte at a time must still find the terminator.
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        for &b in b"slow" {
            buf.extend_from_slice(&[b]);
            assert!(codec.decode(&mut buf).unwrap().is_none());
        }
        buf.extend_from_slice(&[FRAME_TERMINATOR]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Bytes::from("slow"));
    }
}
