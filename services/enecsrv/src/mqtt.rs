//! MQTT publish sink
//!
//! Publishing is best effort. The sink holds one client for the whole
//! process; a background task drives the event loop and tracks broker
//! state, and `publish` hands samples to the client without waiting.
//! When the broker is away, publishes fail fast and ingest continues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tracing::{debug, error, info};

use crate::config::MqttSettings;
use crate::error::{EnecsrvError, Result};

const EVENT_CHANNEL_CAPACITY: usize = 100;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Best-effort publisher for per-sample topics
pub struct MqttSink {
    inner: Option<SinkInner>,
}

struct SinkInner {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttSink {
    /// A sink that accepts nothing and reports disabled
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Connect to the broker and keep the session alive in the background
    pub fn connect(settings: &MqttSettings) -> Self {
        let mut options = MqttOptions::new(
            &settings.client_name,
            &settings.host,
            settings.port,
        );
        options.set_credentials(&settings.user_name, &settings.password);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, EVENT_CHANNEL_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&connected);
        let broker = format!("{}:{}", settings.host, settings.port);
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        if !flag.swap(true, Ordering::Relaxed) {
                            info!(broker = %broker, "Connected to MQTT broker");
                        }
                    }
                    Ok(event) => {
                        debug!(?event, "MQTT event");
                    }
                    Err(err) => {
                        if flag.swap(false, Ordering::Relaxed) {
                            error!(broker = %broker, %err, "MQTT connection lost, retrying");
                        } else {
                            debug!(broker = %broker, %err, "MQTT connect attempt failed");
                        }
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        Self {
            inner: Some(SinkInner { client, connected }),
        }
    }

    /// Build a sink from optional broker settings
    pub fn from_config(settings: Option<&MqttSettings>) -> Self {
        match settings {
            Some(settings) => Self::connect(settings),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.connected.load(Ordering::Relaxed))
    }

    /// Queue one retained sample; a disabled sink drops it silently
    ///
    /// Retained messages let subscribers see the latest value for every
    /// topic immediately on subscribe, matching the exporter's
    /// last-value semantics.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        if !inner.connected.load(Ordering::Relaxed) {
            return Err(EnecsrvError::mqtt("broker not connected"));
        }
        inner
            .client
            .try_publish(topic, QoS::AtMostOnce, true, payload)?;
        Ok(())
    }
}
