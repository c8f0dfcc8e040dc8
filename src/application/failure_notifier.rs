use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::domain::{models::NotificationMessage, ports::NotificationPublisher};

// SNS rejects subjects longer than this.
const MAX_SUBJECT_CHARS: usize = 100;

/// Best-effort failure alert. Never returns an error to the caller.
pub struct FailureNotifier {
    publisher: Arc<dyn NotificationPublisher>,
    timeout: Duration,
}

impl FailureNotifier {
    pub fn new(publisher: Arc<dyn NotificationPublisher>, timeout: Duration) -> Self {
        Self { publisher, timeout }
    }

    pub async fn notify(&self, job_name: &str, error_message: &str, topic_arn: &str, run_id: Uuid) {
        let message = compose_message(job_name, error_message, run_id, Utc::now());
        debug!("Sending failure notification to {}", topic_arn);

        match tokio::time::timeout(self.timeout, self.publisher.publish(topic_arn, &message)).await {
            Ok(Ok(message_id)) => {
                info!("Message successfully sent to SNS. Message ID: {}", message_id);
            }
            Ok(Err(e)) => {
                warn!("Error occurred while publishing message to SNS: {}", e);
            }
            Err(_) => {
                warn!("Publishing to {} timed out after {}s", topic_arn, self.timeout.as_secs());
            }
        }
    }
}

pub fn compose_message(
    job_name: &str,
    error_message: &str,
    run_id: Uuid,
    failed_at: DateTime<Utc>,
) -> NotificationMessage {
    let subject: String = format!("Job {} Failed", job_name)
        .chars()
        .take(MAX_SUBJECT_CHARS)
        .collect();
    let body = format!(
        "The job '{}' has failed with the following error:\n\n\
         The job encountered an unexpected error during processing: {}\n\n\
         Run ID: {}\nFailed at: {}",
        job_name,
        error_message,
        run_id,
        failed_at.to_rfc3339(),
    );
    NotificationMessage { subject, body }
}
