//! Service configuration
//!
//! Configuration is a single flat YAML file. The file exists mainly to
//! carry MQTT credentials; the daemon is fully functional without it,
//! so nothing in here ever aborts startup. A missing or broken file
//! means the publish sink stays disabled and ingest plus the exporter
//! run on defaults.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use crate::error::Result;

/// Default ingest listener address
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:5040";

/// Default exporter endpoint address
pub const DEFAULT_METRICS_ADDRESS: &str = "0.0.0.0:5041";

/// Default first topic segment for published samples
pub const DEFAULT_TOPIC_NAMESPACE: &str = "enecsys";

const DEFAULT_MQTT_PORT: u16 = 1883;

/// Raw file shape, all keys optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    user_name: Option<String>,
    password: Option<String>,
    mqtt_address: Option<String>,
    client_name: Option<String>,
    listen_address: Option<String>,
    metrics_address: Option<String>,
    topic_namespace: Option<String>,
}

/// Broker connection settings, present only when the file carries the
/// full credential set
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub user_name: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub client_name: String,
}

/// Effective service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_address: String,
    pub metrics_address: String,
    pub topic_namespace: String,
    pub mqtt: Option<MqttSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            metrics_address: DEFAULT_METRICS_ADDRESS.to_string(),
            topic_namespace: DEFAULT_TOPIC_NAMESPACE.to_string(),
            mqtt: None,
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults on any failure
    pub fn load(path: Option<&Path>) -> Config {
        let Some(path) = path else {
            warn!("No configuration file given, MQTT publishing disabled");
            return Config::default();
        };

        let file = match read_config_file(path) {
            Ok(file) => file,
            Err(err) => {
                error!(path = %path.display(), %err, "Could not load configuration file");
                warn!("MQTT publishing disabled");
                return Config::default();
            }
        };

        let defaults = Config::default();
        Config {
            listen_address: file.listen_address.unwrap_or(defaults.listen_address),
            metrics_address: file.metrics_address.unwrap_or(defaults.metrics_address),
            topic_namespace: file.topic_namespace.unwrap_or(defaults.topic_namespace),
            mqtt: mqtt_settings(
                file.user_name,
                file.password,
                file.mqtt_address,
                file.client_name,
            ),
        }
    }

    /// Log the effective settings at startup
    pub fn report(&self) {
        info!(
            listen = %self.listen_address,
            metrics = %self.metrics_address,
            namespace = %self.topic_namespace,
            "Ingest configuration"
        );
        match &self.mqtt {
            Some(mqtt) => info!(
                broker = %format!("{}:{}", mqtt.host, mqtt.port),
                client = %mqtt.client_name,
                user = %mqtt.user_name,
                "MQTT publishing active"
            ),
            None => warn!("MQTT publishing disabled"),
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path)?;
    let file = serde_yaml::from_str(&contents)?;
    Ok(file)
}

/// Assemble broker settings from the credential keys
///
/// All four keys are required together. Each missing key is reported
/// on its own so a half-filled file shows every gap at once.
fn mqtt_settings(
    user_name: Option<String>,
    password: Option<String>,
    mqtt_address: Option<String>,
    client_name: Option<String>,
) -> Option<MqttSettings> {
    let mut missing = false;
    for (key, value) in [
        ("userName", &user_name),
        ("password", &password),
        ("mqttAddress", &mqtt_address),
        ("clientName", &client_name),
    ] {
        if value.is_none() {
            warn!("{key} missing from configuration");
            missing = true;
        }
    }
    if missing {
        warn!(
            "Configuration needs userName, password, mqttAddress and clientName \
             for publishing, MQTT publishing disabled"
        );
        return None;
    }

    // The loop above verified all four are present.
    let address = mqtt_address?;
    let (host, port) = match parse_broker(&address) {
        Ok(parsed) => parsed,
        Err(err) => {
            error!(address = %address, %err, "Invalid mqttAddress, MQTT publishing disabled");
            return None;
        }
    };

    Some(MqttSettings {
        user_name: user_name?,
        password: password?,
        host,
        port,
        client_name: client_name?,
    })
}

/// Split a broker address of the form `tcp://host:1883`
fn parse_broker(address: &str) -> std::result::Result<(String, u16), String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    let host = url
        .host_str()
        .ok_or_else(|| format!("no host in {address:?}"))?;
    let port = url.port().unwrap_or(DEFAULT_MQTT_PORT);
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_no_path_gives_defaults() {
        let config = Config::load(None);
        assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert_eq!(config.metrics_address, DEFAULT_METRICS_ADDRESS);
        assert_eq!(config.topic_namespace, DEFAULT_TOPIC_NAMESPACE);
        assert!(config.mqtt.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/enecsrv.yml")));
        assert!(config.mqtt.is_none());
        assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
    }

    #[test]
    fn test_unparseable_file_gives_defaults() {
        let file = write_config("userName: [unclosed");
        let config = Config::load(Some(file.path()));
        assert!(config.mqtt.is_none());
    }

    #[test]
    fn test_full_credentials_enable_mqtt() {
        let file = write_config(
            "userName: mosquittouser\n\
             password: secret\n\
             mqttAddress: \"tcp://192.168.22.77:1883\"\n\
             clientName: enecsysPusher\n",
        );
        let config = Config::load(Some(file.path()));
        let mqtt = config.mqtt.expect("mqtt settings");
        assert_eq!(mqtt.user_name, "mosquittouser");
        assert_eq!(mqtt.password, "secret");
        assert_eq!(mqtt.host, "192.168.22.77");
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.client_name, "enecsysPusher");
    }

    #[test]
    fn test_partial_credentials_disable_mqtt() {
        let file = write_config(
            "userName: mosquittouser\n\
             mqttAddress: \"tcp://broker:1883\"\n",
        );
        let config = Config::load(Some(file.path()));
        assert!(config.mqtt.is_none());
    }

    #[test]
    fn test_broker_port_defaults_to_1883() {
        let file = write_config(
            "userName: u\n\
             password: p\n\
             mqttAddress: \"tcp://broker.local\"\n\
             clientName: c\n",
        );
        let config = Config::load(Some(file.path()));
        let mqtt = config.mqtt.expect("mqtt settings");
        assert_eq!(mqtt.host, "broker.local");
        assert_eq!(mqtt.port, 1883);
    }

    #[test]
    fn test_invalid_broker_address_disables_mqtt() {
        let file = write_config(
            "userName: u\n\
             password: p\n\
             mqttAddress: \"::not a url::\"\n\
             clientName: c\n",
        );
        let config = Config::load(Some(file.path()));
        assert!(config.mqtt.is_none());
    }

    #[test]
    fn test_address_overrides() {
        let file = write_config(
            "listenAddress: \"127.0.0.1:6040\"\n\
             metricsAddress: \"127.0.0.1:6041\"\n\
             topicNamespace: solar\n",
        );
        let config = Config::load(Some(file.path()));
        assert_eq!(config.listen_address, "127.0.0.1:6040");
        assert_eq!(config.metrics_address, "127.0.0.1:6041");
        assert_eq!(config.topic_namespace, "solar");
        assert!(config.mqtt.is_none());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let file = write_config("future: value\nlistenAddress: \"0.0.0.0:7000\"\n");
        let config = Config::load(Some(file.path()));
        assert_eq!(config.listen_address, "0.0.0.0:7000");
    }

    #[test]
    fn test_parse_broker() {
        assert_eq!(
            parse_broker("tcp://192.168.22.77:1883").unwrap(),
            ("192.168.22.77".to_string(), 1883)
        );
        assert_eq!(
            parse_broker("tcp://broker:2883").unwrap(),
            ("broker".to_string(), 2883)
        );
        assert!(parse_broker("not a url").is_err());
    }
}
