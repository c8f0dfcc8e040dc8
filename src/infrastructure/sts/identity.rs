use async_trait::async_trait;
use aws_sdk_sts::{error::DisplayErrorContext, Client};
use tracing::{debug, error};
use crate::domain::{error::JobError, ports::IdentityResolver};

pub struct StsIdentityResolver {
    client: Client,
}

impl StsIdentityResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn account_id(&self) -> Result<String, JobError> {
        let response = self.client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                error!("Error occurred while fetching AWS account ID: {}", DisplayErrorContext(&e));
                JobError::Identity(DisplayErrorContext(&e).to_string())
            })?;

        let account = response
            .account()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| JobError::Identity("caller identity has no account".to_string()))?;

        debug!("Resolved AWS account ID {}", account);
        Ok(account.to_string())
    }
}
