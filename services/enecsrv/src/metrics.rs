//! Prometheus exporter
//!
//! One gauge family per metric, labelled by inverter id, plus a small
//! set of service counters for stream health. Everything lives in a
//! registry owned by [`Metrics`] so tests get isolated state instead
//! of the process-global default registry.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, IntCounter, IntCounterVec, Registry, TextEncoder};
use serde_json::json;
use tracing::error;

use enec_frame::Metric;

use crate::error::Result;
use crate::mqtt::MqttSink;

/// Gauge families and service counters behind the exporter endpoint
pub struct Metrics {
    registry: Registry,

    temperature: GaugeVec,
    wh: GaugeVec,
    kwh: GaugeVec,
    life_wh: GaugeVec,
    time1: GaugeVec,
    time2: GaugeVec,
    dcpower: GaugeVec,
    dcvolt: GaugeVec,
    dccurrent: GaugeVec,
    efficiency: GaugeVec,
    acpower: GaugeVec,
    acvolt: GaugeVec,
    accurrent: GaugeVec,
    acfreq: GaugeVec,

    frames_total: IntCounter,
    frames_ignored: IntCounter,
    frame_errors: IntCounterVec,
    samples_skipped: IntCounterVec,
    publish_errors: IntCounter,
}

fn device_gauge(name: &str, help: &str) -> GaugeVec {
    GaugeVec::new(prometheus::opts!(name, help), &["id"]).expect("Failed to create gauge")
}

impl Metrics {
    pub fn new() -> Self {
        let metrics = Self {
            registry: Registry::new(),

            temperature: device_gauge("enecsys_temperature", "Temperature of the solar panel."),
            wh: device_gauge("enecsys_watthours_today", "Watt hours produced today."),
            kwh: device_gauge(
                "enecsys_kilowatthours_history",
                "Watt hours produced in history.",
            ),
            life_wh: device_gauge("enecsys_watthours_total", "Watt hours produced in total."),
            time1: device_gauge("enecsys_time1", "Time 1."),
            time2: device_gauge("enecsys_time2", "Time 2."),
            dcpower: device_gauge("enecsys_dc_power", "DC power."),
            dcvolt: device_gauge("enecsys_dc_volt", "DC voltage."),
            dccurrent: device_gauge("enecsys_dc_current", "DC current."),
            efficiency: device_gauge("enecsys_efficiency", "Inverter efficiency."),
            acpower: device_gauge("enecsys_ac_power", "AC power."),
            acvolt: device_gauge("enecsys_ac_volt", "AC voltage."),
            accurrent: device_gauge("enecsys_ac_current", "AC current."),
            acfreq: device_gauge("enecsys_ac_frequency", "AC frequency."),

            frames_total: IntCounter::new(
                "enecsrv_frames_total",
                "Frames received on the ingest socket.",
            )
            .expect("Failed to create counter"),
            frames_ignored: IntCounter::new(
                "enecsrv_frames_ignored_total",
                "Frames ignored as non-telemetry.",
            )
            .expect("Failed to create counter"),
            frame_errors: IntCounterVec::new(
                prometheus::opts!(
                    "enecsrv_frame_errors_total",
                    "Telemetry frames dropped by decode stage."
                ),
                &["reason"],
            )
            .expect("Failed to create counter"),
            samples_skipped: IntCounterVec::new(
                prometheus::opts!(
                    "enecsrv_samples_skipped_total",
                    "Samples skipped because the value is undefined."
                ),
                &["metric"],
            )
            .expect("Failed to create counter"),
            publish_errors: IntCounter::new(
                "enecsrv_publish_errors_total",
                "Samples the MQTT sink could not accept.",
            )
            .expect("Failed to create counter"),
        };

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(metrics.temperature.clone()),
            Box::new(metrics.wh.clone()),
            Box::new(metrics.kwh.clone()),
            Box::new(metrics.life_wh.clone()),
            Box::new(metrics.time1.clone()),
            Box::new(metrics.time2.clone()),
            Box::new(metrics.dcpower.clone()),
            Box::new(metrics.dcvolt.clone()),
            Box::new(metrics.dccurrent.clone()),
            Box::new(metrics.efficiency.clone()),
            Box::new(metrics.acpower.clone()),
            Box::new(metrics.acvolt.clone()),
            Box::new(metrics.accurrent.clone()),
            Box::new(metrics.acfreq.clone()),
            Box::new(metrics.frames_total.clone()),
            Box::new(metrics.frames_ignored.clone()),
            Box::new(metrics.frame_errors.clone()),
            Box::new(metrics.samples_skipped.clone()),
            Box::new(metrics.publish_errors.clone()),
        ];
        for collector in collectors {
            metrics
                .registry
                .register(collector)
                .expect("Failed to register collector");
        }

        metrics
    }

    fn gauge(&self, metric: Metric) -> &GaugeVec {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Wh => &self.wh,
            Metric::Kwh => &self.kwh,
            Metric::LifeWh => &self.life_wh,
            Metric::Time1 => &self.time1,
            Metric::Time2 => &self.time2,
            Metric::DcPower => &self.dcpower,
            Metric::DcVolt => &self.dcvolt,
            Metric::DcCurrent => &self.dccurrent,
            Metric::Efficiency => &self.efficiency,
            Metric::AcPower => &self.acpower,
            Metric::AcVolt => &self.acvolt,
            Metric::AcCurrent => &self.accurrent,
            Metric::AcFreq => &self.acfreq,
        }
    }

    /// Set one device gauge; the same id always lands on the same series
    pub fn set_device_gauge(&self, metric: Metric, device_id: &str, value: f64) {
        self.gauge(metric).with_label_values(&[device_id]).set(value);
    }

    pub fn record_frame(&self) {
        self.frames_total.inc();
    }

    pub fn record_ignored(&self) {
        self.frames_ignored.inc();
    }

    pub fn record_frame_error(&self, reason: &str) {
        self.frame_errors.with_label_values(&[reason]).inc();
    }

    pub fn record_skipped_sample(&self, metric: Metric) {
        self.samples_skipped.with_label_values(&[metric.name()]).inc();
    }

    pub fn record_publish_error(&self) {
        self.publish_errors.inc();
    }

    /// Render the registry in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::error::EnecsrvError::Metrics(e.to_string()))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state behind the exporter endpoint
#[derive(Clone)]
pub struct ExporterState {
    pub metrics: Arc<Metrics>,
    pub sink: Arc<MqttSink>,
    pub started: Instant,
}

/// Build the exporter router with `/metrics` and `/health`
pub fn exporter_router(state: ExporterState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the exporter until the listener fails
pub async fn serve_exporter(listener: tokio::net::TcpListener, state: ExporterState) {
    let app = exporter_router(state);
    if let Err(err) = axum::serve(listener, app).await {
        error!(%err, "Exporter server failed");
    }
}

async fn metrics_handler(State(state): State<ExporterState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(%err, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

async fn health_handler(State(state): State<ExporterState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "enecsrv",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started.elapsed().as_secs(),
        "mqtt": {
            "enabled": state.sink.is_enabled(),
            "connected": state.sink.is_connected(),
        },
    }))
}
