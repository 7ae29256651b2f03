//! TCP ingest listener
//!
//! Gateways hold one long-lived connection each and write frames as
//! the inverters report. Connections are independent; a decode failure
//! affects only the frame it came from, while framing failures drop
//! the connection and let the gateway redial.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, trace, warn};

use enec_frame::{decode_payload, derive, extract, FrameCodec, FrameError, TelemetryFrame};

use crate::dispatch::Dispatcher;
use crate::metrics::Metrics;

/// What became of one delimited frame
#[derive(Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Telemetry decoded and handed to the dispatcher
    Dispatched { device_id: String },
    /// Not a telemetry frame, dropped without error
    Ignored,
    /// Telemetry frame the decode stage rejected
    Failed,
}

/// Accept gateway connections until the process exits
pub async fn run_listener(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<Metrics>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "Gateway connected");
                let dispatcher = Arc::clone(&dispatcher);
                let metrics = Arc::clone(&metrics);
                tokio::spawn(handle_connection(stream, peer, dispatcher, metrics));
            }
            Err(err) => {
                error!(%err, "Accept failed");
            }
        }
    }
}

/// Drain one gateway connection frame by frame
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<Metrics>,
) {
    let mut frames = FramedRead::new(stream, FrameCodec::new());
    while let Some(next) = frames.next().await {
        match next {
            Ok(frame) => {
                process_frame(&frame, &dispatcher, &metrics);
            }
            Err(err) => {
                metrics.record_frame_error(error_reason(&err));
                warn!(%peer, %err, "Connection failed");
                break;
            }
        }
    }
    debug!(%peer, "Gateway disconnected");
}

/// Run one delimited frame through classify, decode, extract, dispatch
pub fn process_frame(
    frame: &[u8],
    dispatcher: &Dispatcher,
    metrics: &Metrics,
) -> FrameOutcome {
    metrics.record_frame();

    let Some(telemetry) = TelemetryFrame::classify(frame) else {
        metrics.record_ignored();
        trace!(len = frame.len(), "Non-telemetry frame ignored");
        return FrameOutcome::Ignored;
    };

    let digest = match decode_payload(telemetry.payload()) {
        Ok(digest) => digest,
        Err(err) => {
            metrics.record_frame_error(error_reason(&err));
            warn!(%err, "Frame payload rejected");
            return FrameOutcome::Failed;
        }
    };
    debug!(digest = %digest, len = digest.len(), "Frame decoded");

    let raw = match extract(&digest) {
        Ok(raw) => raw,
        Err(err) => {
            metrics.record_frame_error(error_reason(&err));
            warn!(%err, "Frame digest rejected");
            return FrameOutcome::Failed;
        }
    };

    let derived = derive(&raw);
    let outcome = dispatcher.dispatch(&raw, &derived);
    debug!(
        device_id = %raw.device_id,
        exported = outcome.exported,
        published = outcome.published,
        skipped = outcome.skipped,
        failed = outcome.publish_failures,
        "Frame dispatched"
    );
    FrameOutcome::Dispatched {
        device_id: raw.device_id,
    }
}

/// Counter label for a decode or framing failure
fn error_reason(err: &FrameError) -> &'static str {
    match err {
        FrameError::PayloadDecode(_) => "decode",
        FrameError::DigestTooShort { .. } | FrameError::FieldParse { .. } => "extract",
        FrameError::FrameTooLong { .. } | FrameError::Io(_) => "stream",
    }
}

/// Bind the ingest listener, logging the address it serves
pub async fn bind_listener(address: &str) -> crate::error::Result<TcpListener> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Ingest listener ready");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::MqttSink;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use enec_frame::{FRAME_LEN, MARKER};

    const DIGEST: &str = concat!(
        "deadbeef",
        "0000000000",
        "04d2",
        "00000000",
        "01e240",
        "0000000000",
        "0010",
        "00c8",
        "0032",
        "32",
        "0064",
        "32",
        "0014",
        "012c",
        "0000000000",
    );

    fn telemetry_frame(digest: &str) -> Vec<u8> {
        let payload = URL_SAFE_NO_PAD.encode(hex::decode(digest).unwrap());
        let mut frame = Vec::with_capacity(FRAME_LEN);
        frame.extend_from_slice(b"000000000000000000");
        frame.extend_from_slice(MARKER);
        frame.push(b'0');
        frame.extend_from_slice(payload.as_bytes());
        frame
    }

    fn harness() -> (Arc<Metrics>, Dispatcher) {
        let metrics = Arc::new(Metrics::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&metrics),
            Arc::new(MqttSink::disabled()),
            "enecsys".to_string(),
        );
        (metrics, dispatcher)
    }

    #[test]
    fn test_process_telemetry_frame() {
        let (metrics, dispatcher) = harness();
        let frame = telemetry_frame(DIGEST);
        assert_eq!(frame.len(), FRAME_LEN);

        let outcome = process_frame(&frame, &dispatcher, &metrics);
        assert_eq!(
            outcome,
            FrameOutcome::Dispatched {
                device_id: "deadbeef".to_string()
            }
        );

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("enecsrv_frames_total 1"));
        assert!(rendered.contains("enecsys_temperature{id=\"deadbeef\"} 50"));
    }

    #[test]
    fn test_process_ignores_other_frames() {
        let (metrics, dispatcher) = harness();

        assert_eq!(
            process_frame(b"status: ok", &dispatcher, &metrics),
            FrameOutcome::Ignored
        );
        let mut wrong_marker = telemetry_frame(DIGEST);
        wrong_marker[18] = b'X';
        assert_eq!(
            process_frame(&wrong_marker, &dispatcher, &metrics),
            FrameOutcome::Ignored
        );
        assert_eq!(
            process_frame(&[], &dispatcher, &metrics),
            FrameOutcome::Ignored
        );

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("enecsrv_frames_total 3"));
        assert!(rendered.contains("enecsrv_frames_ignored_total 3"));
    }

    #[test]
    fn test_process_rejects_corrupt_payload() {
        let (metrics, dispatcher) = harness();
        let mut frame = telemetry_frame(DIGEST);
        frame[25] = b'!';

        assert_eq!(process_frame(&frame, &dispatcher, &metrics), FrameOutcome::Failed);
        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("enecsrv_frame_errors_total{reason=\"decode\"} 1"));
    }

    #[test]
    fn test_error_reason_labels() {
        let decode_err = enec_frame::decode_payload(b"!!").unwrap_err();
        assert_eq!(error_reason(&decode_err), "decode");
        assert_eq!(
            error_reason(&FrameError::DigestTooShort {
                len: 8,
                required: 74
            }),
            "extract"
        );
        assert_eq!(
            error_reason(&FrameError::FrameTooLong { limit: 4096 }),
            "stream"
        );
    }

    #[tokio::test]
    async fn test_bind_listener_reports_address_in_use() {
        let first = bind_listener("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap();
        assert!(bind_listener(&taken.to_string()).await.is_err());
    }
}
