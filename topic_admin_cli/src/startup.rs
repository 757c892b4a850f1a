use crate::app_config::AppConfig;
use crate::retry::{with_backoff, RetryPolicy};
use anyhow::Context;
use std::time::Duration;
use topic_admin::commands::create_topic::NewTopicRequest;
use topic_admin::{AdminError, ErrorKind, Operation, TopicAdminClient};
use tracing::{error, info, warn};

pub async fn run_until_stopped(config: AppConfig) -> Result<(), anyhow::Error> {
    let client = TopicAdminClient::connect(&config.connection_settings(), config.admin_settings())
        .context("While creating admin client")?;

    let result = run_sequence(&client, &config).await;

    if !client.close().await {
        warn!("Admin client closed before all requests finished");
    }

    result
}

/// list -> describe (creating missing topics) -> create -> delete.
///
/// Domain errors are logged and the sequence moves on. Transport errors that
/// survive the retry policy abort it.
pub async fn run_sequence(client: &TopicAdminClient, config: &AppConfig) -> Result<(), anyhow::Error> {
    let retry = config.retry_policy();

    let topics = with_backoff(&retry, Operation::ListTopics, move || client.list_topics())
        .await
        .context("While listing topics")?;
    for name in topics {
        info!("Topic: {name}");
    }

    for topic in &config.topics {
        describe_or_create(client, &retry, topic).await?;
    }

    let new_topic = config.new_topic_request();
    create_topic(client, &retry, &new_topic).await?;

    let mut to_delete = config.topics.clone();
    if !to_delete.contains(&new_topic.name) {
        to_delete.push(new_topic.name.clone());
    }
    let deleted = delete_topics(client, &retry, &to_delete).await?;

    for topic in &deleted {
        await_deletion(client, topic, config.deletion_wait()).await?;
    }

    Ok(())
}

async fn describe_or_create(
    client: &TopicAdminClient,
    retry: &RetryPolicy,
    topic: &str,
) -> Result<(), anyhow::Error> {
    let result = with_backoff(retry, Operation::DescribeTopic, move || {
        client.describe_topic(topic)
    })
    .await;

    match result {
        Ok(description) => {
            info!("Description of topic {topic}: {description:?}");
            Ok(())
        }
        Err(AdminError::TopicNotFound(_)) => {
            info!("Topic {topic} does not exist. Going to create it now");
            create_topic(client, retry, &NewTopicRequest::default_for(topic)).await
        }
        Err(e) => recover_or_abort(e, Operation::DescribeTopic, topic),
    }
}

async fn create_topic(
    client: &TopicAdminClient,
    retry: &RetryPolicy,
    request: &NewTopicRequest,
) -> Result<(), anyhow::Error> {
    let result = with_backoff(retry, Operation::CreateTopic, move || {
        client.create_topic(request)
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(AdminError::TopicAlreadyExists(_)) => {
            info!("Topic {} already exists", request.name);
            Ok(())
        }
        Err(e) => recover_or_abort(e, Operation::CreateTopic, &request.name),
    }
}

async fn delete_topics(
    client: &TopicAdminClient,
    retry: &RetryPolicy,
    topics: &[String],
) -> Result<Vec<String>, anyhow::Error> {
    let result = with_backoff(retry, Operation::DeleteTopics, move || {
        client.delete_topics(topics)
    })
    .await;

    match result {
        Ok(outcome) => Ok(outcome.deleted),
        Err(e) => {
            recover_or_abort(e, Operation::DeleteTopics, &topics.join(","))?;
            Ok(vec![])
        }
    }
}

/// Deletion is asynchronous on the brokers, so poll until the topic is gone.
async fn await_deletion(
    client: &TopicAdminClient,
    topic: &str,
    wait: Duration,
) -> Result<(), anyhow::Error> {
    let deadline = tokio::time::Instant::now() + wait;
    let mut delay = Duration::from_millis(50);

    loop {
        match client.describe_topic(topic).await {
            Err(AdminError::TopicNotFound(_)) => {
                info!("Topic {topic} is gone");
                return Ok(());
            }
            Ok(_) => {}
            Err(e) if e.is_retryable() => {
                warn!("Failed to check deletion of topic {topic}: {e}");
            }
            Err(e) => return recover_or_abort(e, Operation::DescribeTopic, topic),
        }

        if tokio::time::Instant::now() + delay > deadline {
            warn!("Topic {topic} is still around after {wait:?}");
            return Ok(());
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(Duration::from_secs(1));
    }
}

fn recover_or_abort(
    error: AdminError,
    operation: Operation,
    topic: &str,
) -> Result<(), anyhow::Error> {
    match error.kind() {
        ErrorKind::Transport => Err(anyhow::Error::new(error)
            .context(format!("While trying to {operation} for topic {topic}"))),
        _ => {
            error!("Failed to {operation} for topic {topic}: {error}");
            Ok(())
        }
    }
}
