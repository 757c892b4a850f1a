mod in_memory;
mod kafka;

pub use in_memory::InMemoryTransport;
pub use kafka::KafkaTransport;

use crate::commands::create_topic::NewTopicRequest;
use crate::commands::delete_topics::DeleteTopicsOutcome;
use crate::error::AdminError;
use crate::queries::describe_topic::TopicDescription;
use async_trait::async_trait;
use std::time::Duration;

/// Performs the admin RPCs against a broker cluster. `timeout` is the budget
/// the broker gets for one request; the caller still bounds its own wait.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    async fn list_topics(&self, timeout: Duration) -> Result<Vec<String>, AdminError>;

    async fn describe_topic(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<TopicDescription, AdminError>;

    async fn create_topic(
        &self,
        request: &NewTopicRequest,
        timeout: Duration,
    ) -> Result<(), AdminError>;

    async fn delete_topics(
        &self,
        names: &[String],
        timeout: Duration,
    ) -> Result<DeleteTopicsOutcome, AdminError>;
}
