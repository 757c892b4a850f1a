use crate::commands::create_topic::NewTopicRequest;
use crate::commands::delete_topics::DeleteTopicsOutcome;
use crate::connection_settings::ConnectionSettings;
use crate::error::{AdminError, Operation};
use crate::queries::describe_topic::{PartitionDescription, TopicDescription};
use crate::transport::BrokerTransport;
use anyhow::Context;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication, TopicResult};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::metadata::Metadata;
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;

pub struct KafkaTransport {
    client: Arc<AdminClient<DefaultClientContext>>,
}

impl KafkaTransport {
    pub fn create(connection_settings: &ConnectionSettings) -> Result<Self, AdminError> {
        let mut config = ClientConfig::try_from(connection_settings)?;

        // https://raw.githubusercontent.com/confluentinc/librdkafka/master/CONFIGURATION.md
        let client: AdminClient<DefaultClientContext> = config
            .set("allow.auto.create.topics", "false")
            .create()
            .map_err(|e| match e {
                KafkaError::ClientConfig(..) => AdminError::InvalidConfiguration(e.to_string()),
                e => AdminError::Transport(
                    anyhow::Error::new(e).context("While creating kafka AdminClient"),
                ),
            })?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Metadata requests are blocking in librdkafka, so they run on the
    /// blocking pool and `map` extracts what is needed there.
    async fn fetch_metadata<T, F>(
        &self,
        operation: Operation,
        topic: Option<String>,
        timeout: Duration,
        map: F,
    ) -> Result<T, AdminError>
    where
        T: Send + 'static,
        F: FnOnce(&Metadata) -> Result<T, AdminError> + Send + 'static,
    {
        let client = self.client.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let metadata = client
                .inner()
                .fetch_metadata(topic.as_deref(), timeout)
                .map_err(|e| AdminError::from_kafka_error(operation, e, timeout))?;
            map(&metadata)
        });

        handle
            .await
            .context("While joining blocking handle")
            .map_err(AdminError::Transport)?
    }

    fn options(timeout: Duration) -> AdminOptions {
        AdminOptions::new()
            .request_timeout(Some(timeout))
            .operation_timeout(Some(timeout))
    }
}

#[async_trait]
impl BrokerTransport for KafkaTransport {
    async fn list_topics(&self, timeout: Duration) -> Result<Vec<String>, AdminError> {
        self.fetch_metadata(Operation::ListTopics, None, timeout, |metadata| {
            let names = metadata
                .topics()
                .iter()
                .map(|topic| topic.name().to_owned())
                .collect::<Vec<_>>();
            Ok(names)
        })
        .await
    }

    async fn describe_topic(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<TopicDescription, AdminError> {
        let name = name.to_owned();
        self.fetch_metadata(
            Operation::DescribeTopic,
            Some(name.clone()),
            timeout,
            move |metadata| to_description(metadata, name, timeout),
        )
        .await
    }

    async fn create_topic(
        &self,
        request: &NewTopicRequest,
        timeout: Duration,
    ) -> Result<(), AdminError> {
        let new_topic = NewTopic::new(
            &request.name,
            request.partitions,
            TopicReplication::Fixed(request.replication_factor),
        );

        let results = self
            .client
            .create_topics([&new_topic], &Self::options(timeout))
            .await
            .map_err(|e| AdminError::from_kafka_error(Operation::CreateTopic, e, timeout))?;

        for result in results {
            if let Err((topic, code)) = result {
                return Err(AdminError::from_broker_code(
                    Operation::CreateTopic,
                    &topic,
                    code,
                    timeout,
                ));
            }
        }

        Ok(())
    }

    async fn delete_topics(
        &self,
        names: &[String],
        timeout: Duration,
    ) -> Result<DeleteTopicsOutcome, AdminError> {
        let topic_names = names.iter().map(String::as_str).collect::<Vec<_>>();

        let results = self
            .client
            .delete_topics(&topic_names, &Self::options(timeout))
            .await
            .map_err(|e| AdminError::from_kafka_error(Operation::DeleteTopics, e, timeout))?;

        collect_delete_results(results, timeout)
    }
}

fn to_description(
    metadata: &Metadata,
    name: String,
    timeout: Duration,
) -> Result<TopicDescription, AdminError> {
    let topic = metadata
        .topics()
        .iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| AdminError::not_found(name.as_str()))?;

    if let Some(error) = topic.error() {
        let code: RDKafkaErrorCode = error.into();
        return Err(AdminError::from_broker_code(
            Operation::DescribeTopic,
            &name,
            code,
            timeout,
        ));
    }

    let partitions = topic
        .partitions()
        .iter()
        .map(|partition| PartitionDescription {
            id: partition.id(),
            leader: Some(partition.leader()).filter(|leader| *leader >= 0),
            replicas: partition.replicas().to_vec(),
            isr: partition.isr().to_vec(),
        })
        .collect::<Vec<_>>();

    Ok(TopicDescription { name, partitions })
}

fn collect_delete_results(
    results: Vec<TopicResult>,
    timeout: Duration,
) -> Result<DeleteTopicsOutcome, AdminError> {
    let mut outcome = DeleteTopicsOutcome::default();
    for result in results {
        match result {
            Ok(topic) => outcome.deleted.push(topic),
            Err((topic, code)) => {
                match AdminError::from_broker_code(Operation::DeleteTopics, &topic, code, timeout) {
                    AdminError::TopicNotFound(_) => outcome.missing.push(topic),
                    error => return Err(error),
                }
            }
        }
    }

    Ok(outcome)
}
