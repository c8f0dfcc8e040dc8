use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::{error::JobError, models::ObjectLocation};

/// Settings for one load job. Built once at startup and passed to the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub region: String,
    pub secret_name: String,
    pub table_name: String,
    pub topic_name: String,
    pub file_name: String,
    /// Bucket is `{bucket_prefix}-{account_id}-{region}`.
    pub bucket_prefix: String,
    pub key_prefix: String,
    /// Full `s3://bucket/key` path; replaces the derived location when set.
    pub source_path: Option<String>,
    pub job_name: String,
    pub insert_batch_size: usize,
    pub step_timeout_secs: u64,
    /// Bounds the bulk load, which grows with the file.
    pub load_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Custom AWS endpoint, e.g. LocalStack.
    pub endpoint_url: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            secret_name: "dev/database-1/salesdb".to_string(),
            table_name: "sales".to_string(),
            topic_name: "dehtopic".to_string(),
            file_name: "sales_rds_excercise_full.csv".to_string(),
            bucket_prefix: "dehlive-sales".to_string(),
            key_prefix: "raw/maze".to_string(),
            source_path: None,
            job_name: "Sales job to load RDS table".to_string(),
            insert_batch_size: 1000,
            step_timeout_secs: 60,
            load_timeout_secs: 900,
            connect_timeout_secs: 10,
            endpoint_url: None,
        }
    }
}

impl JobConfig {
    pub fn from_env() -> Result<Self, JobError> {
        let defaults = Self::default();

        let config = Self {
            region: env::var("LOAD_JOB_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or(defaults.region),
            secret_name: env::var("LOAD_JOB_SECRET_NAME").unwrap_or(defaults.secret_name),
            table_name: env::var("LOAD_JOB_TABLE_NAME").unwrap_or(defaults.table_name),
            topic_name: env::var("LOAD_JOB_TOPIC_NAME").unwrap_or(defaults.topic_name),
            file_name: env::var("LOAD_JOB_FILE_NAME").unwrap_or(defaults.file_name),
            bucket_prefix: env::var("LOAD_JOB_BUCKET_PREFIX").unwrap_or(defaults.bucket_prefix),
            key_prefix: env::var("LOAD_JOB_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            source_path: env::var("LOAD_JOB_SOURCE_PATH").ok().filter(|p| !p.is_empty()),
            job_name: env::var("LOAD_JOB_NAME").unwrap_or(defaults.job_name),
            insert_batch_size: positive_var("LOAD_JOB_INSERT_BATCH_SIZE", defaults.insert_batch_size),
            step_timeout_secs: positive_var("LOAD_JOB_STEP_TIMEOUT_SECS", defaults.step_timeout_secs),
            load_timeout_secs: positive_var("LOAD_JOB_LOAD_TIMEOUT_SECS", defaults.load_timeout_secs),
            connect_timeout_secs: positive_var("LOAD_JOB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
        };

        config.validate()?;
        debug!("Loaded job configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JobError> {
        for (name, value) in [
            ("table_name", &self.table_name),
            ("secret_name", &self.secret_name),
            ("file_name", &self.file_name),
        ] {
            if value.trim().is_empty() {
                return Err(JobError::Config(format!("{} must not be empty", name)));
            }
        }
        if let Some(path) = &self.source_path {
            ObjectLocation::parse(path)
                .map_err(|e| JobError::Config(format!("LOAD_JOB_SOURCE_PATH: {}", e)))?;
        }
        if self.insert_batch_size == 0 {
            return Err(JobError::Config("insert_batch_size must be > 0".to_string()));
        }
        if self.step_timeout_secs == 0 || self.load_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(JobError::Config("timeouts must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn source_location(&self, account_id: &str) -> Result<ObjectLocation, JobError> {
        if let Some(path) = &self.source_path {
            return ObjectLocation::parse(path);
        }
        let bucket = format!("{}-{}-{}", self.bucket_prefix, account_id, self.region);
        let prefix = self.key_prefix.trim_matches('/');
        let key = if prefix.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", prefix, self.file_name)
        };
        Ok(ObjectLocation::new(bucket, key))
    }

    pub fn topic_arn(&self, account_id: &str) -> String {
        format!("arn:aws:sns:{}:{}:{}", self.region, account_id, self.topic_name)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// Tuning knobs: a bad value falls back to the default instead of failing startup.
fn positive_var<T>(name: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = env::var(name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        Ok(value) => {
            warn!("{}={} must be > 0, using default {}", name, value, default);
            default
        }
        Err(e) => {
            warn!("invalid {}={:?} ({}), using default {}", name, raw, e, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "LOAD_JOB_REGION",
        "AWS_REGION",
        "LOAD_JOB_TABLE_NAME",
        "LOAD_JOB_INSERT_BATCH_SIZE",
        "LOAD_JOB_STEP_TIMEOUT_SECS",
        "LOAD_JOB_LOAD_TIMEOUT_SECS",
        "LOAD_JOB_SOURCE_PATH",
        "AWS_ENDPOINT_URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = JobConfig::from_env().unwrap();
        assert_eq!(config, JobConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("AWS_REGION", "eu-west-1");
        env::set_var("LOAD_JOB_TABLE_NAME", "orders");
        env::set_var("LOAD_JOB_INSERT_BATCH_SIZE", "250");

        let config = JobConfig::from_env().unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.table_name, "orders");
        assert_eq!(config.insert_batch_size, 250);

        env::set_var("LOAD_JOB_REGION", "ap-south-1");
        assert_eq!(JobConfig::from_env().unwrap().region, "ap-south-1");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_bad_numbers_fall_back_to_defaults() {
        clear_env();
        env::set_var("LOAD_JOB_STEP_TIMEOUT_SECS", "soon");
        env::set_var("LOAD_JOB_INSERT_BATCH_SIZE", "0");
        env::set_var("LOAD_JOB_LOAD_TIMEOUT_SECS", "1800");

        let config = JobConfig::from_env().unwrap();
        assert_eq!(config.step_timeout_secs, 60);
        assert_eq!(config.insert_batch_size, 1000);
        assert_eq!(config.load_timeout(), Duration::from_secs(1800));
        clear_env();
    }

    #[test]
    fn test_load_has_its_own_longer_bound() {
        let config = JobConfig::default();
        assert!(config.load_timeout() > config.step_timeout());
        assert!(matches!(
            JobConfig { load_timeout_secs: 0, ..JobConfig::default() }.validate(),
            Err(JobError::Config(_))
        ));
    }

    #[test]
    fn test_derived_addresses() {
        let config = JobConfig::default();
        assert_eq!(
            config.source_location("123456789012").unwrap().to_string(),
            "s3://dehlive-sales-123456789012-us-east-1/raw/maze/sales_rds_excercise_full.csv"
        );
        assert_eq!(config.topic_arn("123456789012"), "arn:aws:sns:us-east-1:123456789012:dehtopic");

        let flat = JobConfig { key_prefix: String::new(), ..JobConfig::default() };
        assert_eq!(flat.source_location("1").unwrap().key, "sales_rds_excercise_full.csv");
    }

    #[test]
    #[serial]
    fn test_source_path_override() {
        clear_env();
        env::set_var("LOAD_JOB_SOURCE_PATH", "s3://landing/daily/sales.csv");
        let config = JobConfig::from_env().unwrap();
        let loc = config.source_location("ignored").unwrap();
        assert_eq!((loc.bucket.as_str(), loc.key.as_str()), ("landing", "daily/sales.csv"));

        env::set_var("LOAD_JOB_SOURCE_PATH", "landing/daily/sales.csv");
        assert!(matches!(JobConfig::from_env(), Err(JobError::Config(_))));
        clear_env();
    }
}
