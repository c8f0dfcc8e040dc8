use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, error};
use crate::{
    domain::{
        error::JobError,
        models::CredentialBundle,
        ports::{DatabaseConnector, TableLoader},
    },
    infrastructure::mysql::table_loader::MySqlTableLoader,
};

/// Opens a single-connection pool to MySQL. One attempt, no retries.
pub struct MySqlConnector {
    connect_timeout: Duration,
    insert_batch_size: usize,
}

impl MySqlConnector {
    pub fn new(connect_timeout: Duration, insert_batch_size: usize) -> Self {
        Self { connect_timeout, insert_batch_size }
    }
}

#[async_trait]
impl DatabaseConnector for MySqlConnector {
    async fn connect(&self, credentials: &CredentialBundle) -> Result<Arc<dyn TableLoader>, JobError> {
        debug!("Connecting to mysql://{}@{}:{}/{}",
            credentials.username, credentials.host, credentials.port, credentials.dbname);

        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.username)
            .password(&credentials.password)
            .database(&credentials.dbname);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to connect to {}:{}: {}", credentials.host, credentials.port, e);
                JobError::Connection(format!("{}:{}/{}: {}", credentials.host, credentials.port, credentials.dbname, e))
            })?;

        info!("Successfully connected to database {} on {}", credentials.dbname, credentials.host);
        Ok(Arc::new(MySqlTableLoader::new(pool, self.insert_batch_size)))
    }
}
