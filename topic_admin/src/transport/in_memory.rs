use crate::commands::create_topic::NewTopicRequest;
use crate::commands::delete_topics::DeleteTopicsOutcome;
use crate::error::AdminError;
use crate::queries::describe_topic::{PartitionDescription, TopicDescription};
use crate::transport::BrokerTransport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// In-process broker cluster.
///
/// Deleted topics stay visible for `deletion_grace` to mimic asynchronous
/// removal on real brokers. Replicas are assigned round-robin across broker
/// ids `0..brokers` and the first replica leads.
pub struct InMemoryTransport {
    brokers: i32,
    deletion_grace: Duration,
    latency: Duration,
    reachable: AtomicBool,
    topics: Mutex<HashMap<String, StoredTopic>>,
}

struct StoredTopic {
    description: TopicDescription,
    deleted_at: Option<Instant>,
}

impl InMemoryTransport {
    pub fn new(brokers: i32) -> Self {
        Self {
            brokers,
            deletion_grace: Duration::ZERO,
            latency: Duration::ZERO,
            reachable: AtomicBool::new(true),
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_deletion_grace(mut self, deletion_grace: Duration) -> Self {
        self.deletion_grace = deletion_grace;
        self
    }

    /// Delay applied before every response.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// While unreachable every request fails with a transport error.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    async fn round_trip(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, StoredTopic>>, AdminError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(AdminError::Transport(anyhow::anyhow!(
                "Broker unreachable: connection refused"
            )));
        }

        let mut topics = self
            .topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        let grace = self.deletion_grace;
        topics.retain(|name, topic| match topic.deleted_at {
            Some(deleted_at) if now.duration_since(deleted_at) >= grace => {
                debug!("Topic {} removed", name);
                false
            }
            _ => true,
        });

        Ok(topics)
    }

    fn assign_partitions(&self, request: &NewTopicRequest) -> Vec<PartitionDescription> {
        (0..request.partitions)
            .map(|id| {
                let replicas = (0..request.replication_factor)
                    .map(|r| (id + r) % self.brokers)
                    .collect::<Vec<_>>();
                PartitionDescription {
                    id,
                    leader: replicas.first().copied(),
                    isr: replicas.clone(),
                    replicas,
                }
            })
            .collect()
    }
}

#[async_trait]
impl BrokerTransport for InMemoryTransport {
    async fn list_topics(&self, _timeout: Duration) -> Result<Vec<String>, AdminError> {
        let topics = self.round_trip().await?;

        Ok(topics.keys().cloned().collect())
    }

    async fn describe_topic(
        &self,
        name: &str,
        _timeout: Duration,
    ) -> Result<TopicDescription, AdminError> {
        let topics = self.round_trip().await?;

        topics
            .get(name)
            .map(|topic| topic.description.clone())
            .ok_or_else(|| AdminError::not_found(name))
    }

    async fn create_topic(
        &self,
        request: &NewTopicRequest,
        _timeout: Duration,
    ) -> Result<(), AdminError> {
        let mut topics = self.round_trip().await?;

        if topics.contains_key(&request.name) {
            return Err(AdminError::TopicAlreadyExists(request.name.clone()));
        }
        request.validate()?;
        if request.replication_factor > self.brokers {
            return Err(AdminError::InvalidConfiguration(format!(
                "Replication factor: {} larger than available brokers: {}",
                request.replication_factor, self.brokers
            )));
        }

        let description = TopicDescription {
            name: request.name.clone(),
            partitions: self.assign_partitions(request),
        };
        topics.insert(
            request.name.clone(),
            StoredTopic {
                description,
                deleted_at: None,
            },
        );

        Ok(())
    }

    async fn delete_topics(
        &self,
        names: &[String],
        _timeout: Duration,
    ) -> Result<DeleteTopicsOutcome, AdminError> {
        let mut topics = self.round_trip().await?;
        let now = Instant::now();

        let mut outcome = DeleteTopicsOutcome::default();
        for name in names {
            match topics.get_mut(name) {
                Some(topic) if topic.deleted_at.is_none() => {
                    topic.deleted_at = Some(now);
                    outcome.deleted.push(name.clone());
                }
                _ => outcome.missing.push(name.clone()),
            }
        }

        Ok(outcome)
    }
}
