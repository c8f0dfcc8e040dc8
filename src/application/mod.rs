pub mod failure_notifier;
pub mod load_job;
