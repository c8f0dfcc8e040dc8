use std::fmt;
use thiserror::Error;

/// Pipeline stage a run is in. `Failed` is reachable from every working stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Fetching,
    Authenticating,
    Connecting,
    Loading,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "START",
            Stage::Fetching => "FETCHING",
            Stage::Authenticating => "AUTHENTICATING",
            Stage::Connecting => "CONNECTING",
            Stage::Loading => "LOADING",
            Stage::Done => "DONE",
            Stage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error resolving AWS account ID: {0}")]
    Identity(String),

    #[error("Error reading CSV from S3: {0}")]
    Fetch(String),

    #[error("Error retrieving secrets: {0}")]
    Secrets(String),

    #[error("Error creating database connection: {0}")]
    Connection(String),

    #[error("Error inserting into database: {0}")]
    Load(String),

    #[error("Error publishing notification: {0}")]
    Notification(String),

    #[error("{stage} step timed out after {secs}s")]
    Timeout { stage: Stage, secs: u64 },
}

impl JobError {
    /// Stage the run was in when this error surfaced.
    pub fn stage(&self) -> Stage {
        match self {
            JobError::Config(_) => Stage::Start,
            JobError::Identity(_) | JobError::Fetch(_) => Stage::Fetching,
            JobError::Secrets(_) => Stage::Authenticating,
            JobError::Connection(_) => Stage::Connecting,
            JobError::Load(_) => Stage::Loading,
            JobError::Notification(_) => Stage::Failed,
            JobError::Timeout { stage, .. } => *stage,
        }
    }
}
