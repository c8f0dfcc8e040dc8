use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::domain::error::JobError;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// A single object in S3, addressed as `s3://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn parse(path: &str) -> Result<Self, JobError> {
        let rest = path
            .strip_prefix("s3://")
            .ok_or_else(|| JobError::Fetch(format!("not an s3:// path: {}", path)))?;

        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::new(bucket, key))
            }
            _ => Err(JobError::Fetch(format!("path has no bucket or key: {}", path))),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Database credentials as stored in the secrets vault.
#[derive(Clone, Deserialize)]
pub struct CredentialBundle {
    pub host: String,
    pub username: String,
    pub password: String,
    pub dbname: String,
    #[serde(default = "default_port", deserialize_with = "port_from_number_or_string")]
    pub port: u16,
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

// Secrets Manager's RDS templates store the port as a number, hand-written
// secrets often store it as a string.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Types a raw CSV field the way a dataframe reader would.
    pub fn infer(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return CellValue::Int(i);
        }
        match field.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(field.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Text,
}

impl ColumnType {
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Rows parsed from the source file. Every row has one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TabularDataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Types raw fields per column: a column holding any non-numeric value
    /// keeps every one of its fields as the original text.
    pub fn from_fields(columns: Vec<String>, fields: Vec<Vec<String>>) -> Self {
        let mut dataset = Self {
            columns,
            rows: fields
                .iter()
                .map(|row| row.iter().map(|f| CellValue::infer(f)).collect())
                .collect(),
        };

        let types = dataset.column_types();
        for (row, raw) in dataset.rows.iter_mut().zip(&fields) {
            for ((cell, ty), field) in row.iter_mut().zip(&types).zip(raw) {
                if *ty == ColumnType::Text && !field.is_empty() {
                    *cell = CellValue::Text(field.clone());
                }
            }
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Narrowest SQL type able to hold every value of each column.
    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.columns.len())
            .map(|idx| {
                let mut ty: Option<ColumnType> = None;
                for row in &self.rows {
                    let seen = match row.get(idx) {
                        Some(CellValue::Int(_)) => ColumnType::BigInt,
                        Some(CellValue::Float(_)) => ColumnType::Double,
                        Some(CellValue::Text(_)) => return ColumnType::Text,
                        Some(CellValue::Null) | None => continue,
                    };
                    ty = Some(match (ty, seen) {
                        (None, t) => t,
                        (Some(ColumnType::BigInt), ColumnType::BigInt) => ColumnType::BigInt,
                        _ => ColumnType::Double,
                    });
                }
                ty.unwrap_or(ColumnType::Text)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl JobResult {
    pub const SUCCESS: u16 = 200;
    pub const FAILURE: u16 = 500;

    pub fn success(rows: u64, table: &str) -> Self {
        Self {
            status_code: Self::SUCCESS,
            body: format!("Data successfully inserted into RDS: {} rows loaded into {}", rows, table),
        }
    }

    pub fn failure(error: &JobError) -> Self {
        Self {
            status_code: Self::FAILURE,
            body: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == Self::SUCCESS
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_path() {
        let loc = ObjectLocation::parse("s3://dehlive-sales-123-us-east-1/raw/maze/sales.csv").unwrap();
        assert_eq!(loc.bucket, "dehlive-sales-123-us-east-1");
        assert_eq!(loc.key, "raw/maze/sales.csv");
        assert_eq!(loc.to_string(), "s3://dehlive-sales-123-us-east-1/raw/maze/sales.csv");
    }

    #[test]
    fn test_parse_s3_path_rejects_bad_input() {
        assert!(matches!(ObjectLocation::parse("https://x/y"), Err(JobError::Fetch(_))));
        assert!(matches!(ObjectLocation::parse("s3://bucket-only"), Err(JobError::Fetch(_))));
        assert!(matches!(ObjectLocation::parse("s3:///key"), Err(JobError::Fetch(_))));
    }

    #[test]
    fn test_credentials_from_secret_string() {
        let creds: CredentialBundle = serde_json::from_str(
            r#"{"username":"admin","password":"pw","host":"db.local","dbname":"salesdb","engine":"mysql"}"#,
        )
        .unwrap();
        assert_eq!(creds.port, DEFAULT_MYSQL_PORT);
        assert_eq!(creds.dbname, "salesdb");

        let creds: CredentialBundle = serde_json::from_str(
            r#"{"username":"a","password":"b","host":"h","dbname":"d","port":"3307"}"#,
        )
        .unwrap();
        assert_eq!(creds.port, 3307);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds: CredentialBundle = serde_json::from_str(
            r#"{"username":"a","password":"hunter2","host":"h","dbname":"d","port":3306}"#,
        )
        .unwrap();
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_cell_inference() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("42"), CellValue::Int(42));
        assert_eq!(CellValue::infer("-1.5"), CellValue::Float(-1.5));
        assert_eq!(CellValue::infer("NaN"), CellValue::Text("NaN".to_string()));
        assert_eq!(CellValue::infer("north"), CellValue::Text("north".to_string()));
    }

    #[test]
    fn test_column_types() {
        let mut ds = TabularDataset::new(vec![
            "id".to_string(),
            "amt".to_string(),
            "region".to_string(),
            "note".to_string(),
        ]);
        ds.rows.push(vec![CellValue::Int(1), CellValue::Int(10), CellValue::Text("n".into()), CellValue::Null]);
        ds.rows.push(vec![CellValue::Int(2), CellValue::Float(2.5), CellValue::Int(3), CellValue::Null]);

        assert_eq!(
            ds.column_types(),
            vec![ColumnType::BigInt, ColumnType::Double, ColumnType::Text, ColumnType::Text]
        );
        assert_eq!(ds.get(1, "amt"), Some(&CellValue::Float(2.5)));
        assert_eq!(ds.get(0, "missing"), None);
    }

    #[test]
    fn test_from_fields_types_whole_columns() {
        let ds = TabularDataset::from_fields(
            vec!["id".to_string(), "ref".to_string()],
            vec![
                vec!["1".to_string(), "007".to_string()],
                vec!["2".to_string(), "".to_string()],
                vec!["3".to_string(), "A7".to_string()],
            ],
        );
        assert_eq!(ds.get(0, "id"), Some(&CellValue::Int(1)));
        assert_eq!(ds.get(0, "ref"), Some(&CellValue::Text("007".to_string())));
        assert_eq!(ds.get(1, "ref"), Some(&CellValue::Null));
        assert_eq!(ds.get(2, "ref"), Some(&CellValue::Text("A7".to_string())));
    }

    #[test]
    fn test_job_result_serializes_lambda_shape() {
        let json = serde_json::to_value(JobResult::success(3, "sales")).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert!(json["body"].as_str().unwrap().contains('3'));
    }
}
