extern crate topic_admin;

use std::sync::Arc;
use std::time::Duration;
use topic_admin::commands::create_topic::NewTopicRequest;
use topic_admin::transport::InMemoryTransport;
use topic_admin::{AdminError, AdminSettings, ErrorKind, Operation, TopicAdminClient};

fn client_for(transport: InMemoryTransport) -> (TopicAdminClient, Arc<InMemoryTransport>) {
    client_with_settings(transport, AdminSettings::default())
}

fn client_with_settings(
    transport: InMemoryTransport,
    settings: AdminSettings,
) -> (TopicAdminClient, Arc<InMemoryTransport>) {
    let transport = Arc::new(transport);
    let client = TopicAdminClient::with_transport(transport.clone(), settings);
    (client, transport)
}

async fn wait_until_gone(client: &TopicAdminClient, name: &str, window: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + window;
    while tokio::time::Instant::now() < deadline {
        match client.describe_topic(name).await {
            Err(AdminError::TopicNotFound(_)) => return true,
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    false
}

#[tokio::test]
async fn describe_after_create_reports_requested_partitions() -> Result<(), AdminError> {
    let (client, _) = client_for(InMemoryTransport::new(3));

    client
        .create_topic(&NewTopicRequest::new("payments", 6, 3))
        .await?;
    let description = client.describe_topic("payments").await?;

    assert_eq!(description.name, "payments");
    assert_eq!(description.partitions_count(), 6);
    assert_eq!(description.replication_factor(), 3);
    for partition in &description.partitions {
        assert_eq!(partition.leader, partition.replicas.first().copied());
    }
    Ok(())
}

#[tokio::test]
async fn second_create_reports_already_exists_and_keeps_topic() -> Result<(), AdminError> {
    let (client, _) = client_for(InMemoryTransport::new(3));
    client
        .create_topic(&NewTopicRequest::new("payments", 2, 1))
        .await?;

    let error = client
        .create_topic(&NewTopicRequest::new("payments", 5, 3))
        .await
        .unwrap_err();

    assert!(matches!(error, AdminError::TopicAlreadyExists(ref name) if name == "payments"));
    assert!(!error.is_retryable());
    let description = client.describe_topic("payments").await?;
    assert_eq!(description.partitions_count(), 2);
    assert_eq!(description.replication_factor(), 1);
    Ok(())
}

#[tokio::test]
async fn describe_of_unknown_topic_is_not_found() {
    let (client, _) = client_for(InMemoryTransport::new(1));

    let error = client.describe_topic("never-created").await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::TopicNotFound);
    assert!(matches!(error, AdminError::TopicNotFound(ref names) if names == &["never-created"]));
}

#[tokio::test]
async fn delete_acknowledges_existing_and_reports_missing() -> Result<(), AdminError> {
    let (client, _) = client_for(InMemoryTransport::new(1));
    client.create_topic(&NewTopicRequest::default_for("a")).await?;
    client.create_topic(&NewTopicRequest::default_for("b")).await?;

    let outcome = client
        .delete_topics(&["a".to_owned(), "ghost".to_owned(), "b".to_owned()])
        .await?;

    assert_eq!(outcome.deleted, vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(outcome.missing, vec!["ghost".to_owned()]);
    assert!(!outcome.is_fully_acknowledged());
    Ok(())
}

#[tokio::test]
async fn delete_of_empty_list_is_acknowledged_without_broker() -> Result<(), AdminError> {
    let (client, transport) = client_for(InMemoryTransport::new(1));
    transport.set_reachable(false);

    let outcome = client.delete_topics(&[]).await?;

    assert!(outcome.deleted.is_empty());
    assert!(outcome.is_fully_acknowledged());
    Ok(())
}

#[tokio::test]
async fn deleted_topic_eventually_disappears() -> Result<(), AdminError> {
    let transport = InMemoryTransport::new(1).with_deletion_grace(Duration::from_millis(50));
    let (client, _) = client_for(transport);
    client
        .create_topic(&NewTopicRequest::default_for("orders"))
        .await?;

    client.delete_topics(&["orders".to_owned()]).await?;

    assert!(wait_until_gone(&client, "orders", Duration::from_secs(2)).await);
    assert!(!client.list_topics().await?.any(|name| name == "orders"));
    Ok(())
}

#[tokio::test]
async fn list_returns_every_topic() -> Result<(), AdminError> {
    let (client, _) = client_for(InMemoryTransport::new(1));
    for name in ["x", "y", "z"] {
        client.create_topic(&NewTopicRequest::default_for(name)).await?;
    }

    let mut names = client.list_topics().await?.collect::<Vec<_>>();
    names.sort();

    assert_eq!(names, vec!["x", "y", "z"]);
    Ok(())
}

#[tokio::test]
async fn replication_above_broker_count_is_invalid_configuration() {
    let (client, _) = client_for(InMemoryTransport::new(2));

    let error = client
        .create_topic(&NewTopicRequest::new("wide", 1, 3))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_any_rpc() {
    let (client, transport) = client_for(InMemoryTransport::new(1));
    transport.set_reachable(false);

    let error = client
        .create_topic(&NewTopicRequest::new("orders", 0, 1))
        .await
        .unwrap_err();

    assert!(matches!(error, AdminError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn unreachable_broker_is_retryable_transport_error() {
    let (client, transport) = client_for(InMemoryTransport::new(1));
    transport.set_reachable(false);

    let error = client.list_topics().await.err().unwrap();

    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(error.is_retryable());
}

#[tokio::test]
async fn slow_broker_times_out() {
    let transport = InMemoryTransport::new(1).with_latency(Duration::from_millis(500));
    let settings = AdminSettings {
        request_timeout: Duration::from_millis(20),
        ..AdminSettings::default()
    };
    let (client, _) = client_with_settings(transport, settings);

    let error = client.describe_topic("orders").await.unwrap_err();

    assert!(matches!(
        error,
        AdminError::Timeout {
            operation: Operation::DescribeTopic,
            ..
        }
    ));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn concurrent_operations_share_one_handle() -> Result<(), AdminError> {
    let transport = InMemoryTransport::new(3).with_latency(Duration::from_millis(10));
    let (client, _) = client_for(transport);
    let client = Arc::new(client);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let client = client.clone();
        tasks.spawn(async move {
            let request = NewTopicRequest::new(format!("topic-{i}"), i + 1, 1);
            client.create_topic(&request).await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.expect("create task panicked")?;
    }

    assert_eq!(client.list_topics().await?.count(), 8);
    assert_eq!(client.describe_topic("topic-3").await?.partitions_count(), 4);
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_rejects_later_operations() {
    let (client, _) = client_for(InMemoryTransport::new(1));

    assert!(!client.is_closed());
    assert!(client.close().await);
    assert!(client.close().await);
    assert!(client.is_closed());

    let error = client.list_topics().await.err().unwrap();
    assert!(matches!(error, AdminError::Closed));
}

#[tokio::test]
async fn closed_handle_rejects_even_empty_delete() {
    let (client, _) = client_for(InMemoryTransport::new(1));
    client.close().await;

    let result = client.delete_topics(&[]).await;

    assert!(matches!(result, Err(AdminError::Closed)));
}

#[tokio::test]
async fn repeated_names_are_deleted_once() -> Result<(), AdminError> {
    let (client, _) = client_for(InMemoryTransport::new(1));
    client.create_topic(&NewTopicRequest::default_for("a")).await?;

    let outcome = client
        .delete_topics(&[
            "a".to_owned(),
            "ghost".to_owned(),
            "a".to_owned(),
            "ghost".to_owned(),
        ])
        .await?;

    assert_eq!(outcome.deleted, vec!["a".to_owned()]);
    assert_eq!(outcome.missing, vec!["ghost".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn concurrent_close_waits_for_the_first_one() {
    let transport = InMemoryTransport::new(1).with_latency(Duration::from_secs(10));
    let settings = AdminSettings {
        request_timeout: Duration::from_secs(30),
        close_grace_period: Duration::from_millis(50),
    };
    let (client, _) = client_with_settings(transport, settings);

    let (described, first, second) = tokio::join!(
        client.describe_topic("orders"),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            client.close().await
        },
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.close().await
        }
    );

    assert!(matches!(described, Err(AdminError::Closed)));
    assert!(!first);
    assert!(!second);
    assert!(!client.close().await);
}

#[tokio::test]
async fn close_lets_in_flight_operations_finish() -> Result<(), AdminError> {
    let transport = InMemoryTransport::new(1).with_latency(Duration::from_millis(100));
    let (client, _) = client_for(transport);
    let orders = NewTopicRequest::default_for("orders");

    let (created, drained) = tokio::join!(
        client.create_topic(&orders),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.close().await
        }
    );

    created?;
    assert!(drained);
    Ok(())
}

#[tokio::test]
async fn close_cancels_operations_past_grace_period() {
    let transport = InMemoryTransport::new(1).with_latency(Duration::from_secs(10));
    let settings = AdminSettings {
        request_timeout: Duration::from_secs(30),
        close_grace_period: Duration::from_millis(50),
    };
    let (client, _) = client_with_settings(transport, settings);

    let (described, drained) = tokio::join!(client.describe_topic("orders"), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.close().await
    });

    assert!(!drained);
    assert!(matches!(described, Err(AdminError::Closed)));
}

#[tokio::test]
async fn orders_lifecycle() -> Result<(), AdminError> {
    let transport = InMemoryTransport::new(1).with_deletion_grace(Duration::from_millis(30));
    let (client, _) = client_for(transport);
    let orders = NewTopicRequest::new("orders", 1, 1);

    client.create_topic(&orders).await?;
    assert_eq!(client.describe_topic("orders").await?.partitions.len(), 1);

    let again = client.create_topic(&orders).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::TopicAlreadyExists);

    let outcome = client.delete_topics(&["orders".to_owned()]).await?;
    assert_eq!(outcome.deleted, vec!["orders".to_owned()]);

    assert!(wait_until_gone(&client, "orders", Duration::from_secs(2)).await);
    assert!(client.close().await);
    Ok(())
}
