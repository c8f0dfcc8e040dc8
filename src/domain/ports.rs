use async_trait::async_trait;
use std::sync::Arc;
use crate::domain::{
    error::JobError,
    models::{CredentialBundle, NotificationMessage, TabularDataset},
};

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn account_id(&self) -> Result<String, JobError>;
}

#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch_file(&self, bucket: &str, key: &str) -> Result<Vec<u8>, JobError>;
}

#[async_trait]
pub trait SecretRetriever: Send + Sync {
    async fn get_credentials(&self, secret_name: &str) -> Result<CredentialBundle, JobError>;
}

#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, credentials: &CredentialBundle) -> Result<Arc<dyn TableLoader>, JobError>;
}

/// A live database handle able to bulk replace a table.
#[async_trait]
pub trait TableLoader: Send + Sync {
    /// Replaces the whole contents of `table` with `dataset`, returning rows written.
    async fn replace_table(&self, table: &str, dataset: &TabularDataset) -> Result<u64, JobError>;
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Returns the message id acknowledged by the topic.
    async fn publish(&self, topic_arn: &str, message: &NotificationMessage) -> Result<String, JobError>;
}
