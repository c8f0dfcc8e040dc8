use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{debug, info, error};
use crate::domain::{
    error::JobError,
    models::{CellValue, TabularDataset},
    ports::TableLoader,
};

// MySQL caps prepared statements at 65535 placeholders.
const MAX_PLACEHOLDERS: usize = 65_535;

pub struct MySqlTableLoader {
    pool: MySqlPool,
    insert_batch_size: usize,
}

impl MySqlTableLoader {
    pub fn new(pool: MySqlPool, insert_batch_size: usize) -> Self {
        Self { pool, insert_batch_size }
    }
}

#[async_trait]
impl TableLoader for MySqlTableLoader {
    async fn replace_table(&self, table: &str, dataset: &TabularDataset) -> Result<u64, JobError> {
        if dataset.columns.is_empty() {
            return Err(JobError::Load(format!("no columns to create table {}", table)));
        }

        // DDL commits implicitly in MySQL, so only the row inserts share the transaction.
        debug!("Recreating table {}", table);
        sqlx::query(&drop_table_sql(table))
            .execute(&self.pool)
            .await
            .map_err(|e| load_error(table, "drop", e))?;
        sqlx::query(&create_table_sql(table, dataset))
            .execute(&self.pool)
            .await
            .map_err(|e| load_error(table, "create", e))?;

        let mut tx = self.pool.begin().await.map_err(|e| load_error(table, "begin", e))?;
        let batch_size = effective_batch_size(self.insert_batch_size, dataset.columns.len());
        let mut written = 0u64;

        for chunk in dataset.rows.chunks(batch_size) {
            let mut query_builder: QueryBuilder<MySql> =
                QueryBuilder::new(insert_prefix(table, &dataset.columns));

            query_builder.push_values(chunk, |mut b, row| {
                for cell in row {
                    match cell {
                        CellValue::Null => b.push_bind(None::<String>),
                        CellValue::Int(i) => b.push_bind(*i),
                        CellValue::Float(f) => b.push_bind(*f),
                        CellValue::Text(s) => b.push_bind(s.clone()),
                    };
                }
            });

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| load_error(table, "insert", e))?;
            written += result.rows_affected();
            debug!("Inserted {} of {} rows into {}", written, dataset.len(), table);
        }

        tx.commit().await.map_err(|e| load_error(table, "commit", e))?;
        info!("Inserted {} rows into the database table {}", written, table);
        Ok(written)
    }
}

fn load_error(table: &str, action: &str, e: sqlx::Error) -> JobError {
    error!("Failed to {} table {}: {}", action, table, e);
    JobError::Load(format!("{} {}: {}", action, table, e))
}

pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn create_table_sql(table: &str, dataset: &TabularDataset) -> String {
    let columns: Vec<String> = dataset
        .columns
        .iter()
        .zip(dataset.column_types())
        .map(|(name, ty)| format!("{} {} NULL", quote_ident(name), ty.sql_name()))
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), columns.join(", "))
}

pub fn insert_prefix(table: &str, columns: &[String]) -> String {
    let columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    format!("INSERT INTO {} ({}) ", quote_ident(table), columns.join(", "))
}

pub fn effective_batch_size(configured: usize, column_count: usize) -> usize {
    let cap = MAX_PLACEHOLDERS / column_count.max(1);
    configured.min(cap).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> TabularDataset {
        let mut ds = TabularDataset::new(vec!["id".to_string(), "amt".to_string(), "sold by".to_string()]);
        ds.rows.push(vec![CellValue::Int(1), CellValue::Float(10.5), CellValue::Text("x".into())]);
        ds
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("sales"), "`sales`");
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_create_table_uses_inferred_types() {
        assert_eq!(
            create_table_sql("sales", &sales()),
            "CREATE TABLE `sales` (`id` BIGINT NULL, `amt` DOUBLE NULL, `sold by` TEXT NULL)"
        );
        assert_eq!(drop_table_sql("sales"), "DROP TABLE IF EXISTS `sales`");
    }

    #[test]
    fn test_insert_prefix() {
        assert_eq!(
            insert_prefix("sales", &sales().columns),
            "INSERT INTO `sales` (`id`, `amt`, `sold by`) "
        );
    }

    #[test]
    fn test_batch_size_respects_placeholder_cap() {
        assert_eq!(effective_batch_size(1000, 3), 1000);
        assert_eq!(effective_batch_size(1000, 100), 655);
        assert_eq!(effective_batch_size(1000, 100_000), 1);
    }
}
