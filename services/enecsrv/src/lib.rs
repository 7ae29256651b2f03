//! Enecsys telemetry ingest daemon
//!
//! Listens for gateway TCP connections, decodes telemetry frames with
//! [`enec_frame`], and fans the samples out to a Prometheus exporter
//! and an optional MQTT sink. The binary in `main.rs` wires these
//! modules together; everything here is also usable from integration
//! tests.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod mqtt;
pub mod server;

pub use config::{Config, MqttSettings};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{EnecsrvError, Result};
pub use metrics::{exporter_router, serve_exporter, ExporterState, Metrics};
pub use mqtt::MqttSink;
pub use server::{bind_listener, handle_connection, process_frame, run_listener, FrameOutcome};
