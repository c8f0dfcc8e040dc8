pub mod mysql;
pub mod parsers;
pub mod s3;
pub mod secretsmanager;
pub mod sns;
pub mod sts;
