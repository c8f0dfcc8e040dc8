use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Cursor;
use tracing::{debug, info, error};
use crate::domain::{error::JobError, models::TabularDataset};

pub fn parse_csv(bytes: &[u8]) -> Result<TabularDataset, JobError> {
    debug!("Creating CSV reader with headers enabled");
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        error!("CSV file is empty");
        return Err(JobError::Fetch("CSV file is empty, no header row".to_string()));
    }

    let cursor = Cursor::new(bytes);
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(cursor);

    let headers = reader.headers()
        .map_err(|e| {
            error!("Failed to read CSV headers: {}", e);
            JobError::Fetch(format!("malformed CSV header: {}", e))
        })?.clone();

    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    let mut seen = HashSet::new();
    for column in &columns {
        if column.is_empty() {
            return Err(JobError::Fetch("CSV header contains an empty column name".to_string()));
        }
        if !seen.insert(column.as_str()) {
            return Err(JobError::Fetch(format!("CSV header repeats column '{}'", column)));
        }
    }

    debug!("CSV headers: {:?}", columns);
    info!("Found {} columns in CSV", columns.len());

    let mut fields: Vec<Vec<String>> = Vec::new();
    let mut row_count = 0;

    for record in reader.records() {
        // csv rejects ragged rows unless the reader is flexible.
        let record = record.map_err(|e| {
            error!("Failed to read CSV record at row {}: {}", row_count + 1, e);
            JobError::Fetch(format!("malformed CSV at row {}: {}", row_count + 1, e))
        })?;

        row_count += 1;
        fields.push(record.iter().map(str::to_string).collect());

        if row_count % 1000 == 0 {
            debug!("Processed {} CSV rows", row_count);
        }
    }

    info!("Parsed {} rows from CSV", row_count);
    Ok(TabularDataset::from_fields(columns, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CellValue, ColumnType};

    #[test]
    fn test_parse_typed_rows() {
        let ds = parse_csv(b"id,amt,region\n1,10,north\n2,20.5,\n").unwrap();
        assert_eq!(ds.columns, vec!["id", "amt", "region"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0, "id"), Some(&CellValue::Int(1)));
        assert_eq!(ds.get(1, "amt"), Some(&CellValue::Float(20.5)));
        assert_eq!(ds.get(1, "region"), Some(&CellValue::Null));
        assert_eq!(ds.get(0, "region"), Some(&CellValue::Text("north".to_string())));
    }

    #[test]
    fn test_mixed_column_keeps_source_text() {
        let ds = parse_csv(b"zip,code,amt\n02134,1.50,7\nabc,x,2.25\n").unwrap();
        assert_eq!(ds.column_types(), vec![ColumnType::Text, ColumnType::Text, ColumnType::Double]);
        assert_eq!(ds.get(0, "zip"), Some(&CellValue::Text("02134".to_string())));
        assert_eq!(ds.get(0, "code"), Some(&CellValue::Text("1.50".to_string())));
        assert_eq!(ds.get(1, "zip"), Some(&CellValue::Text("abc".to_string())));
        assert_eq!(ds.get(0, "amt"), Some(&CellValue::Int(7)));
        assert_eq!(ds.get(1, "amt"), Some(&CellValue::Float(2.25)));
    }

    #[test]
    fn test_header_only_yields_empty_dataset() {
        let ds = parse_csv(b"id,amt\n").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.columns.len(), 2);
    }

    #[test]
    fn test_quoted_fields() {
        let ds = parse_csv(b"id,name\n1,\"Smith, J\"\n").unwrap();
        assert_eq!(ds.get(0, "name"), Some(&CellValue::Text("Smith, J".to_string())));
    }

    #[test]
    fn test_malformed_input_is_fetch_error() {
        assert!(matches!(parse_csv(b""), Err(JobError::Fetch(_))));
        assert!(matches!(parse_csv(b"id,amt\n1,2,3\n"), Err(JobError::Fetch(_))));
        assert!(matches!(parse_csv(b"id,id\n1,2\n"), Err(JobError::Fetch(_))));
        assert!(matches!(parse_csv(b"id,,x\n1,2,3\n"), Err(JobError::Fetch(_))));
    }
}
