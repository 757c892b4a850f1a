use crate::retry::RetryPolicy;
use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use serde::Deserialize;
use std::time::Duration;
use topic_admin::commands::create_topic::NewTopicRequest;
use topic_admin::connection_settings::{ConnectionSettings, SecurityProtocol};
use topic_admin::AdminSettings;
use tracing::info;

/// Keys not listed here are ignored.
#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    #[serde(default)]
    pub security_protocol: SecurityProtocol,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_close_grace_period_ms")]
    pub close_grace_period_ms: u64,
    /// Topics described (and created when missing), then deleted.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub new_topic: NewTopicConfig,
    #[serde(default = "default_deletion_wait_ms")]
    pub deletion_wait_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct NewTopicConfig {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl Default for NewTopicConfig {
    fn default() -> Self {
        Self {
            name: "NewCountry".to_owned(),
            partitions: 1,
            replication_factor: 1,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 2000,
        }
    }
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_owned()]
}

fn default_topics() -> Vec<String> {
    vec!["CustomerCountry".to_owned(), "MyCountry".to_owned()]
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_close_grace_period_ms() -> u64 {
    30_000
}

fn default_deletion_wait_ms() -> u64 {
    10_000
}

impl AppConfig {
    pub fn build() -> Result<Self, anyhow::Error> {
        let builder = Config::builder()
            .add_source(config::File::with_name("appsettings").required(false))
            .add_source(
                config::Environment::with_prefix("App")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("brokers")
                    .with_list_parse_key("topics")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, anyhow::Error> {
        let config = builder.build().context("While building config")?;

        let deserialized_config: AppConfig = config
            .try_deserialize()
            .context("While deserializing config")?;

        info!("App config: {deserialized_config:?}");

        Ok(deserialized_config)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            brokers: self.brokers.clone(),
            security_protocol: self.security_protocol,
        }
    }

    pub fn admin_settings(&self) -> AdminSettings {
        AdminSettings {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            close_grace_period: Duration::from_millis(self.close_grace_period_ms),
        }
    }

    pub fn new_topic_request(&self) -> NewTopicRequest {
        NewTopicRequest::new(
            self.new_topic.name.clone(),
            self.new_topic.partitions,
            self.new_topic.replication_factor,
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn deletion_wait(&self) -> Duration {
        Duration::from_millis(self.deletion_wait_ms)
    }
}
