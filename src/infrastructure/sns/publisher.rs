use async_trait::async_trait;
use aws_sdk_sns::{error::DisplayErrorContext, Client};
use tracing::debug;
use crate::domain::{error::JobError, models::NotificationMessage, ports::NotificationPublisher};

pub struct SnsPublisher {
    client: Client,
}

impl SnsPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationPublisher for SnsPublisher {
    async fn publish(&self, topic_arn: &str, message: &NotificationMessage) -> Result<String, JobError> {
        debug!("Publishing to {}", topic_arn);

        let response = self.client
            .publish()
            .topic_arn(topic_arn)
            .subject(&message.subject)
            .message(&message.body)
            .send()
            .await
            .map_err(|e| JobError::Notification(DisplayErrorContext(&e).to_string()))?;

        Ok(response.message_id().unwrap_or_default().to_string())
    }
}
