//! Service error types

use thiserror::Error;

/// Errors surfaced by the ingest daemon
#[derive(Debug, Error)]
pub enum EnecsrvError {
    /// Configuration file problems
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket binds and other IO failures
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Publish sink failures
    #[error("MQTT error: {0}")]
    Mqtt(String),

    /// Exporter rendering failures
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl EnecsrvError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn mqtt(msg: impl Into<String>) -> Self {
        Self::Mqtt(msg.into())
    }
}

impl From<serde_yaml::Error> for EnecsrvError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(format!("YAML: {err}"))
    }
}

impl From<rumqttc::ClientError> for EnecsrvError {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Mqtt(err.to_string())
    }
}

impl From<prometheus::Error> for EnecsrvError {
    fn from(err: prometheus::Error) -> Self {
        Self::Metrics(err.to_string())
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, EnecsrvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EnecsrvError::config("missing userName");
        assert_eq!(err.to_string(), "Configuration error: missing userName");

        let err = EnecsrvError::mqtt(String::from("broker not connected"));
        assert_eq!(err.to_string(), "MQTT error: broker not connected");
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("[unclosed").unwrap_err();
        let err: EnecsrvError = yaml_err.into();
        assert!(matches!(err, EnecsrvError::Config(_)));
        assert!(err.to_string().contains("YAML"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "bind");
        let err: EnecsrvError = io_err.into();
        assert!(matches!(err, EnecsrvError::Io(_)));
    }
}
