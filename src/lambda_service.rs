use std::sync::Arc;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, debug};
use crate::{
    application::load_job::LoadJob,
    config::JobConfig,
    domain::models::JobResult,
    infrastructure::{
        mysql::connector::MySqlConnector,
        s3::file_fetcher::S3FileFetcher,
        secretsmanager::secret_retriever::SecretsManagerRetriever,
        sns::publisher::SnsPublisher,
        sts::identity::StsIdentityResolver,
    },
};

/// Holds what is safe to share between invocations: the configuration and
/// the resolved AWS settings. Clients and the database pool are built fresh
/// for every run.
pub struct LambdaService {
    config: JobConfig,
    aws_config: SdkConfig,
}

impl LambdaService {
    pub async fn new(config: JobConfig) -> Self {
        debug!("Loading AWS configuration");
        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        // Configure endpoint for LocalStack if AWS_ENDPOINT_URL is set
        if let Some(endpoint_url) = &config.endpoint_url {
            info!("Using custom AWS endpoint: {}", endpoint_url);
            aws_config_builder = aws_config_builder.endpoint_url(endpoint_url);
        }

        let aws_config = aws_config_builder.load().await;
        debug!("AWS region: {:?}", aws_config.region());

        Self { config, aws_config }
    }

    pub fn build_job(&self) -> LoadJob {
        let mut s3_config = aws_sdk_s3::config::Builder::from(&self.aws_config);

        // Enable path-style addressing for LocalStack
        if self.config.endpoint_url.is_some() {
            s3_config = s3_config.force_path_style(true);
        }

        let s3_client = aws_sdk_s3::Client::from_conf(s3_config.build());
        let sts_client = aws_sdk_sts::Client::new(&self.aws_config);
        let secrets_client = aws_sdk_secretsmanager::Client::new(&self.aws_config);
        let sns_client = aws_sdk_sns::Client::new(&self.aws_config);
        debug!("AWS clients initialized");

        LoadJob::new(
            self.config.clone(),
            Arc::new(StsIdentityResolver::new(sts_client)),
            Arc::new(S3FileFetcher::new(s3_client)),
            Arc::new(SecretsManagerRetriever::new(secrets_client)),
            Arc::new(MySqlConnector::new(self.config.connect_timeout(), self.config.insert_batch_size)),
            Arc::new(SnsPublisher::new(sns_client)),
        )
    }

    /// Lambda handler. Job failures are reported in the result, never as a handler error.
    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<JobResult, Error> {
        debug!("Invocation {} received", event.context.request_id);
        Ok(self.build_job().run().await)
    }
}
