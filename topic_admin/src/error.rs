use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListTopics,
    DescribeTopic,
    CreateTopic,
    DeleteTopics,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ListTopics => write!(f, "list topics"),
            Operation::DescribeTopic => write!(f, "describe topic"),
            Operation::CreateTopic => write!(f, "create topic"),
            Operation::DeleteTopics => write!(f, "delete topics"),
        }
    }
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    TopicNotFound,
    TopicAlreadyExists,
    InvalidConfiguration,
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("transport failure: {0:#}")]
    Transport(anyhow::Error),
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: Operation,
        timeout: Duration,
    },
    #[error("admin client is closed")]
    Closed,
    #[error("topic(s) not found: {}", .0.join(", "))]
    TopicNotFound(Vec<String>),
    #[error("topic '{0}' already exists")]
    TopicAlreadyExists(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::Transport(_) | AdminError::Timeout { .. } | AdminError::Closed => {
                ErrorKind::Transport
            }
            AdminError::TopicNotFound(_) => ErrorKind::TopicNotFound,
            AdminError::TopicAlreadyExists(_) => ErrorKind::TopicAlreadyExists,
            AdminError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
        }
    }

    /// A closed client stays closed, so `Closed` is not worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdminError::Transport(_) | AdminError::Timeout { .. })
    }

    pub fn not_found(topic: impl Into<String>) -> Self {
        AdminError::TopicNotFound(vec![topic.into()])
    }

    /// Maps a per-topic broker error code onto the taxonomy.
    pub fn from_broker_code(
        operation: Operation,
        topic: &str,
        code: RDKafkaErrorCode,
        timeout: Duration,
    ) -> Self {
        match code {
            RDKafkaErrorCode::TopicAlreadyExists => AdminError::TopicAlreadyExists(topic.to_owned()),
            RDKafkaErrorCode::UnknownTopicOrPartition | RDKafkaErrorCode::UnknownTopic => {
                AdminError::not_found(topic)
            }
            RDKafkaErrorCode::InvalidPartitions
            | RDKafkaErrorCode::InvalidReplicationFactor
            | RDKafkaErrorCode::InvalidReplicaAssignment
            | RDKafkaErrorCode::InvalidConfig
            | RDKafkaErrorCode::InvalidTopic
            | RDKafkaErrorCode::PolicyViolation
            | RDKafkaErrorCode::InvalidRequest => {
                AdminError::InvalidConfiguration(format!("{code} (topic '{topic}')"))
            }
            RDKafkaErrorCode::RequestTimedOut | RDKafkaErrorCode::OperationTimedOut => {
                AdminError::Timeout { operation, timeout }
            }
            other => AdminError::Transport(anyhow::anyhow!(
                "Broker rejected {operation} for topic '{topic}': {other}"
            )),
        }
    }

    /// Maps a whole-request librdkafka failure onto the taxonomy.
    pub fn from_kafka_error(operation: Operation, error: KafkaError, timeout: Duration) -> Self {
        match error.rdkafka_error_code() {
            Some(RDKafkaErrorCode::RequestTimedOut | RDKafkaErrorCode::OperationTimedOut) => {
                AdminError::Timeout { operation, timeout }
            }
            Some(
                RDKafkaErrorCode::InvalidConfig
                | RDKafkaErrorCode::InvalidArgument
                | RDKafkaErrorCode::InvalidRequest,
            ) => AdminError::InvalidConfiguration(format!("{error}")),
            _ => AdminError::Transport(
                anyhow::Error::new(error).context(format!("While trying to {operation}")),
            ),
        }
    }
}
