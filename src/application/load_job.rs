use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, debug, error, warn, Instrument};
use uuid::Uuid;
use crate::{
    application::failure_notifier::FailureNotifier,
    config::JobConfig,
    domain::{
        error::{JobError, Stage},
        models::JobResult,
        ports::{DatabaseConnector, FileFetcher, IdentityResolver, NotificationPublisher, SecretRetriever},
    },
    infrastructure::parsers::csv_parser::parse_csv,
};

/// Outcome of one run, with the detail tests and callers need beyond the status.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub result: JobResult,
    /// `Done` or `Failed`.
    pub final_stage: Stage,
    /// Stage that was active when the run failed.
    pub failed_in: Option<Stage>,
    pub error: Option<JobError>,
    pub rows_loaded: Option<u64>,
}

/// Fetch, authenticate, connect, load. Each step feeds the next; the first
/// error skips the rest and triggers one failure notification.
pub struct LoadJob {
    config: JobConfig,
    identity: Arc<dyn IdentityResolver>,
    file_fetcher: Arc<dyn FileFetcher>,
    secrets: Arc<dyn SecretRetriever>,
    connector: Arc<dyn DatabaseConnector>,
    notifier: FailureNotifier,
}

impl LoadJob {
    pub fn new(
        config: JobConfig,
        identity: Arc<dyn IdentityResolver>,
        file_fetcher: Arc<dyn FileFetcher>,
        secrets: Arc<dyn SecretRetriever>,
        connector: Arc<dyn DatabaseConnector>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        let notifier = FailureNotifier::new(publisher, config.step_timeout());
        Self {
            config,
            identity,
            file_fetcher,
            secrets,
            connector,
            notifier,
        }
    }

    pub async fn run(&self) -> JobResult {
        self.run_detailed().await.result
    }

    pub async fn run_detailed(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("load_job", %run_id, table = %self.config.table_name);

        async move {
            let mut stage = Stage::Start;
            let mut account_id = None;
            info!("Starting load job '{}'", self.config.job_name);

            match self.execute(&mut stage, &mut account_id).await {
                Ok(rows) => {
                    transition(&mut stage, Stage::Done);
                    info!("✅ Loaded {} rows into {}", rows, self.config.table_name);
                    RunReport {
                        run_id,
                        result: JobResult::success(rows, &self.config.table_name),
                        final_stage: stage,
                        failed_in: None,
                        error: None,
                        rows_loaded: Some(rows),
                    }
                }
                Err(e) => {
                    let failed_in = stage;
                    transition(&mut stage, Stage::Failed);
                    error!("Error in {}: {}", failed_in, e);

                    let topic_arn = self.topic_arn(account_id).await;
                    self.notifier
                        .notify(&self.config.job_name, &e.to_string(), &topic_arn, run_id)
                        .await;

                    RunReport {
                        run_id,
                        result: JobResult::failure(&e),
                        final_stage: stage,
                        failed_in: Some(failed_in),
                        error: Some(e),
                        rows_loaded: None,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, stage: &mut Stage, account_id: &mut Option<String>) -> Result<u64, JobError> {
        let timeout = self.config.step_timeout();

        transition(stage, Stage::Fetching);
        let account = bounded(Stage::Fetching, timeout, self.identity.account_id()).await?;
        *account_id = Some(account.clone());

        let location = self.config.source_location(&account)?;
        debug!("Fetching source file {}", location);
        let bytes = bounded(
            Stage::Fetching,
            timeout,
            self.file_fetcher.fetch_file(&location.bucket, &location.key),
        )
        .await?;
        let dataset = parse_csv(&bytes)?;
        info!("Read {} rows from the CSV file {}", dataset.len(), location);

        transition(stage, Stage::Authenticating);
        let credentials = bounded(
            Stage::Authenticating,
            timeout,
            self.secrets.get_credentials(&self.config.secret_name),
        )
        .await?;

        transition(stage, Stage::Connecting);
        let loader = bounded(Stage::Connecting, timeout, self.connector.connect(&credentials)).await?;
        drop(credentials);

        transition(stage, Stage::Loading);
        bounded(
            Stage::Loading,
            self.config.load_timeout(),
            loader.replace_table(&self.config.table_name, &dataset),
        )
        .await
    }

    // Failing to resolve the account here must not hide the original error.
    async fn topic_arn(&self, account_id: Option<String>) -> String {
        let account = match account_id {
            Some(account) => account,
            None => match bounded(Stage::Failed, self.config.step_timeout(), self.identity.account_id()).await {
                Ok(account) => account,
                Err(e) => {
                    warn!("Could not resolve account for notification topic: {}", e);
                    String::new()
                }
            },
        };
        self.config.topic_arn(&account)
    }
}

fn transition(stage: &mut Stage, next: Stage) {
    info!("Job state {} -> {}", stage, next);
    *stage = next;
}

async fn bounded<T, F>(stage: Stage, limit: Duration, step: F) -> Result<T, JobError>
where
    F: Future<Output = Result<T, JobError>>,
{
    tokio::time::timeout(limit, step)
        .await
        .map_err(|_| JobError::Timeout { stage, secs: limit.as_secs() })?
}
