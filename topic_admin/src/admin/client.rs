use crate::admin::AdminSettings;
use crate::commands::create_topic::NewTopicRequest;
use crate::commands::delete_topics::DeleteTopicsOutcome;
use crate::connection_settings::ConnectionSettings;
use crate::error::{AdminError, Operation};
use crate::queries::describe_topic::TopicDescription;
use crate::transport::{BrokerTransport, KafkaTransport};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::select;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Handle to a broker cluster for topic lifecycle operations.
///
/// The handle is either open or closed. Operations may run concurrently on an
/// open handle; each one waits at most `request_timeout` for the broker.
/// `close` drains in-flight operations for up to `close_grace_period` and
/// cancels whatever is left. Dropping an open handle cancels immediately.
pub struct TopicAdminClient {
    transport: Mutex<Option<Arc<dyn BrokerTransport>>>,
    settings: AdminSettings,
    in_flight: TaskTracker,
    shutdown: CancellationToken,
    closed: OnceCell<bool>,
}

impl TopicAdminClient {
    pub fn connect(
        connection_settings: &ConnectionSettings,
        settings: AdminSettings,
    ) -> Result<Self, AdminError> {
        let transport = KafkaTransport::create(connection_settings)?;
        info!("Admin client created for brokers {:?}", connection_settings.brokers);

        Ok(Self::with_transport(Arc::new(transport), settings))
    }

    pub fn with_transport(transport: Arc<dyn BrokerTransport>, settings: AdminSettings) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
            settings,
            in_flight: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            closed: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    pub async fn list_topics(&self) -> Result<impl Iterator<Item = String>, AdminError> {
        let names = self
            .run(Operation::ListTopics, |transport, timeout| async move {
                transport.list_topics(timeout).await
            })
            .await?;
        debug!("Listed {} topics", names.len());

        Ok(names.into_iter())
    }

    pub async fn describe_topic(&self, name: &str) -> Result<TopicDescription, AdminError> {
        let description = self
            .run(Operation::DescribeTopic, |transport, timeout| async move {
                transport.describe_topic(name, timeout).await
            })
            .await?;
        debug!(
            "Topic {} has {} partitions",
            name,
            description.partitions_count()
        );

        Ok(description)
    }

    pub async fn create_topic(&self, request: &NewTopicRequest) -> Result<(), AdminError> {
        request.validate()?;

        self.run(Operation::CreateTopic, |transport, timeout| async move {
            transport.create_topic(request, timeout).await
        })
        .await?;
        info!(
            "Created topic {} with {} partitions and replication factor {}",
            request.name, request.partitions, request.replication_factor
        );

        Ok(())
    }

    /// Acknowledgement only means the brokers accepted the request. The topics
    /// may remain visible for a while afterwards. Repeated names are sent once.
    pub async fn delete_topics(&self, names: &[String]) -> Result<DeleteTopicsOutcome, AdminError> {
        if self.is_closed() {
            return Err(AdminError::Closed);
        }
        if names.is_empty() {
            return Ok(DeleteTopicsOutcome::default());
        }

        let mut seen = HashSet::with_capacity(names.len());
        let unique = names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        let outcome = self
            .run(Operation::DeleteTopics, |transport, timeout| async move {
                transport.delete_topics(&unique, timeout).await
            })
            .await?;

        info!("Deletion of topics {:?} acknowledged", outcome.deleted);
        if !outcome.missing.is_empty() {
            warn!("Topics {:?} did not exist", outcome.missing);
        }

        Ok(outcome)
    }

    /// Returns `true` when every in-flight operation finished within the grace
    /// period. Later and concurrent calls wait for the first close and return
    /// its result.
    pub async fn close(&self) -> bool {
        *self.closed.get_or_init(|| self.drain()).await
    }

    async fn drain(&self) -> bool {
        drop(self.lock_transport().take());

        self.in_flight.close();
        let grace_period = self.settings.close_grace_period;
        let drained = tokio::time::timeout(grace_period, self.in_flight.wait())
            .await
            .is_ok();

        if !drained {
            warn!(
                "{} admin operations still running after {:?}, cancelling",
                self.in_flight.len(),
                grace_period
            );
            self.shutdown.cancel();
            self.in_flight.wait().await;
        }

        info!("Admin client closed");
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.lock_transport().is_none()
    }

    async fn run<T, F, Fut>(&self, operation: Operation, call: F) -> Result<T, AdminError>
    where
        F: FnOnce(Arc<dyn BrokerTransport>, Duration) -> Fut,
        Fut: Future<Output = Result<T, AdminError>>,
    {
        let (transport, _token) = self.acquire()?;
        let timeout = self.settings.request_timeout;

        select! {
            result = tokio::time::timeout(timeout, call(transport, timeout)) => match result {
                Ok(result) => result,
                Err(_) => Err(AdminError::Timeout { operation, timeout }),
            },
            _ = self.shutdown.cancelled() => {
                warn!("Cancelled {} because the admin client was closed", operation);
                Err(AdminError::Closed)
            }
        }
    }

    /// Registers the operation with the tracker while holding the lock, so a
    /// concurrent `close` either sees it in flight or rejects it.
    fn acquire(&self) -> Result<(Arc<dyn BrokerTransport>, TaskTrackerToken), AdminError> {
        let guard = self.lock_transport();
        let transport = guard.as_ref().ok_or(AdminError::Closed)?.clone();

        Ok((transport, self.in_flight.token()))
    }

    fn lock_transport(&self) -> MutexGuard<'_, Option<Arc<dyn BrokerTransport>>> {
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TopicAdminClient {
    fn drop(&mut self) {
        if !self.is_closed() {
            debug!("Admin client dropped without close, releasing connection");
            self.shutdown.cancel();
        }
    }
}
