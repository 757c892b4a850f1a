use crate::error::AdminError;
use rdkafka::ClientConfig;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub brokers: Vec<String>,
    pub security_protocol: SecurityProtocol,
}

impl ConnectionSettings {
    pub fn new(brokers: Vec<String>) -> Self {
        Self {
            brokers,
            security_protocol: SecurityProtocol::default(),
        }
    }

    pub fn validate(&self) -> Result<(), AdminError> {
        if self.brokers.is_empty() {
            return Err(AdminError::InvalidConfiguration(
                "No brokers specified".to_owned(),
            ));
        }

        for broker in &self.brokers {
            validate_endpoint(broker)?;
        }

        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), AdminError> {
    let invalid = || {
        AdminError::InvalidConfiguration(format!(
            "Bootstrap endpoint '{endpoint}' is not in host:port form"
        ))
    };

    let (host, port) = endpoint.trim().rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    port.parse::<u16>().map_err(|_| invalid())?;

    Ok(())
}

impl TryFrom<&ConnectionSettings> for ClientConfig {
    type Error = AdminError;

    fn try_from(value: &ConnectionSettings) -> Result<Self, Self::Error> {
        value.validate()?;

        let mut config = ClientConfig::new();

        let brokers_string = value
            .brokers
            .iter()
            .map(|b| b.trim())
            .collect::<Vec<_>>()
            .join(",");
        config
            .set("bootstrap.servers", brokers_string)
            .set("security.protocol", value.security_protocol.to_string());

        if let Ok(value) = std::env::var("RD_KAFKA_DEBUG") {
            config.set("debug", value);
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityProtocol {
    #[default]
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl Display for SecurityProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityProtocol::Plaintext => write!(f, "plaintext"),
            SecurityProtocol::Ssl => write!(f, "ssl"),
            SecurityProtocol::SaslPlaintext => write!(f, "sasl_plaintext"),
            SecurityProtocol::SaslSsl => write!(f, "sasl_ssl"),
        }
    }
}
