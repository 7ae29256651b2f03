//! Sample fan-out
//!
//! One decoded frame becomes fourteen samples, delivered to the gauge
//! exporter and the MQTT sink in a fixed order. The two sinks never
//! gate each other; a broker outage cannot stop gauge updates.

use std::sync::Arc;

use tracing::debug;

use enec_frame::{format_value, sample_set, DerivedFieldSet, Metric, RawFieldSet};

use crate::metrics::Metrics;
use crate::mqtt::MqttSink;

/// Per-frame delivery totals, for logging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Samples written to the exporter
    pub exported: usize,
    /// Samples handed to the MQTT sink
    pub published: usize,
    /// Samples skipped as undefined
    pub skipped: usize,
    /// Samples the sink refused
    pub publish_failures: usize,
}

/// Routes decoded samples to the exporter and the publish sink
pub struct Dispatcher {
    metrics: Arc<Metrics>,
    sink: Arc<MqttSink>,
    topic_namespace: String,
}

impl Dispatcher {
    pub fn new(metrics: Arc<Metrics>, sink: Arc<MqttSink>, topic_namespace: String) -> Self {
        Self {
            metrics,
            sink,
            topic_namespace,
        }
    }

    /// Publish topic for one sample of one inverter
    fn topic(&self, device_id: &str, metric: Metric) -> String {
        format!("{}/{}/{}", self.topic_namespace, device_id, metric.name())
    }

    /// Deliver every sample of one frame to both sinks
    pub fn dispatch(&self, raw: &RawFieldSet, derived: &DerivedFieldSet) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for (metric, value) in sample_set(raw, derived) {
            let Some(value) = value else {
                self.metrics.record_skipped_sample(metric);
                debug!(
                    device_id = %raw.device_id,
                    metric = %metric,
                    "Sample undefined, skipped"
                );
                outcome.skipped += 1;
                continue;
            };

            self.metrics.set_device_gauge(metric, &raw.device_id, value);
            outcome.exported += 1;

            if !self.sink.is_enabled() {
                continue;
            }
            let topic = self.topic(&raw.device_id, metric);
            match self.sink.publish(&topic, &format_value(value)) {
                Ok(()) => outcome.published += 1,
                Err(err) => {
                    self.metrics.record_publish_error();
                    debug!(topic = %topic, %err, "Publish failed");
                    outcome.publish_failures += 1;
                }
            }
        }

        outcome
    }
}
