use async_trait::async_trait;
use aws_sdk_secretsmanager::{error::DisplayErrorContext, Client};
use tracing::{debug, info, error};
use crate::domain::{error::JobError, models::CredentialBundle, ports::SecretRetriever};

/// Reads database credentials stored as a JSON `SecretString`.
pub struct SecretsManagerRetriever {
    client: Client,
}

impl SecretsManagerRetriever {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretRetriever for SecretsManagerRetriever {
    async fn get_credentials(&self, secret_name: &str) -> Result<CredentialBundle, JobError> {
        debug!("Fetching secret {}", secret_name);

        let response = self.client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(|e| {
                error!("Error retrieving secret {}: {}", secret_name, DisplayErrorContext(&e));
                JobError::Secrets(format!("{}: {}", secret_name, DisplayErrorContext(&e)))
            })?;

        let payload = response
            .secret_string()
            .ok_or_else(|| JobError::Secrets(format!("{} has no SecretString", secret_name)))?;

        let credentials = parse_credentials(payload)
            .map_err(|e| JobError::Secrets(format!("{}: {}", secret_name, e)))?;

        info!("Successfully retrieved database secrets from Secrets Manager");
        Ok(credentials)
    }
}

pub fn parse_credentials(payload: &str) -> Result<CredentialBundle, serde_json::Error> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_rejected() {
        let err = parse_credentials(r#"{"username":"a","password":"b","host":"h"}"#).unwrap_err();
        assert!(err.to_string().contains("dbname"));
    }

    #[test]
    fn test_non_json_is_rejected() {
        assert!(parse_credentials("username=a").is_err());
    }
}
