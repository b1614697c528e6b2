//! SQLite persistence of the cleaned table.
//!
//! One table (default `dataset`) with the message columns followed by one
//! INTEGER column per label. Writes replace the whole table inside a single
//! transaction, so a failed run leaves the previous table untouched.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::models::{Dataset, MessageRecord, MESSAGE_COLUMNS};
use crate::validation::is_valid_identifier;

/// Default table name.
pub const DEFAULT_TABLE: &str = "dataset";

/// SQLite bind parameters per INSERT statement.
const MAX_BINDS_PER_STATEMENT: usize = 900;

/// Quote a table/column name after checking it is a plain identifier.
pub fn quote_ident(name: &str) -> StoreResult<String> {
    if is_valid_identifier(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Handle on the database file plus the table the pipeline uses.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    pool: SqlitePool,
    table: String,
    path: PathBuf,
}

impl DatasetStore {
    /// Open a database for writing, creating the file if needed.
    pub async fn create(path: impl AsRef<Path>, table: &str) -> StoreResult<Self> {
        Self::connect(path.as_ref(), table, true).await
    }

    /// Open an existing database for reading.
    pub async fn open(path: impl AsRef<Path>, table: &str) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        Self::connect(path, table, false).await
    }

    async fn connect(path: &Path, table: &str, create: bool) -> StoreResult<Self> {
        quote_ident(table)?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            table: table.to_string(),
            path: path.to_path_buf(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the table with `dataset`. Returns the number of rows written.
    pub async fn save(&self, dataset: &Dataset) -> StoreResult<usize> {
        let table = quote_ident(&self.table)?;
        let label_columns = dataset
            .labels
            .iter()
            .map(|l| quote_ident(l))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut columns: Vec<String> = MESSAGE_COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
        columns.extend(label_columns.iter().cloned());

        let create = format!(
            "CREATE TABLE {} (\"id\" INTEGER NOT NULL, \"message\" TEXT NOT NULL, \
             \"original\" TEXT, \"genre\" TEXT NOT NULL{})",
            table,
            label_columns
                .iter()
                .map(|c| format!(", {} INTEGER NOT NULL", c))
                .collect::<String>()
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&create).execute(&mut *tx).await?;

        let rows_per_statement = (MAX_BINDS_PER_STATEMENT / columns.len()).max(1);
        let insert_prefix = format!("INSERT INTO {} ({}) ", table, columns.join(", "));

        for chunk in dataset.records.chunks(rows_per_statement) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(&insert_prefix);
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.id)
                    .push_bind(record.message.clone())
                    .push_bind(record.original.clone())
                    .push_bind(record.genre.clone());
                for &value in &record.labels {
                    row.push_bind(i64::from(value));
                }
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(dataset.len())
    }

    /// Column names of the table in declaration order.
    async fn columns(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(&self.table)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("name")).collect())
    }

    /// Load the whole table.
    ///
    /// Every column other than `id`, `message`, `original` and `genre` is a
    /// label column.
    pub async fn load(&self) -> StoreResult<Dataset> {
        let columns = self.columns().await?;
        if columns.is_empty() {
            return Err(StoreError::Schema(format!("table '{}' not found", self.table)));
        }
        for required in ["id", "message", "genre"] {
            if !columns.iter().any(|c| c == required) {
                return Err(StoreError::Schema(format!("missing column '{}'", required)));
            }
        }
        let has_original = columns.iter().any(|c| c == "original");

        let labels: Vec<String> = columns
            .into_iter()
            .filter(|c| !MESSAGE_COLUMNS.iter().any(|m| m.eq_ignore_ascii_case(c)))
            .collect();

        let mut select: Vec<String> = vec!["\"id\"".into(), "\"message\"".into(), "\"genre\"".into()];
        if has_original {
            select.push("\"original\"".into());
        }
        for label in &labels {
            select.push(quote_ident(label)?);
        }
        let label_offset = select.len() - labels.len();

        let query = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            select.join(", "),
            quote_ident(&self.table)?
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(labels.len());
            for (j, label) in labels.iter().enumerate() {
                let raw: i64 = row.try_get(label_offset + j)?;
                let value = u8::try_from(raw)
                    .ok()
                    .filter(|v| *v <= 1)
                    .ok_or_else(|| {
                        StoreError::Schema(format!("label '{}' holds non-binary value {}", label, raw))
                    })?;
                values.push(value);
            }

            records.push(MessageRecord {
                id: row.try_get(0)?,
                message: row.try_get(1)?,
                genre: row.try_get(2)?,
                original: if has_original { row.try_get(3)? } else { None },
                labels: values,
            });
        }

        Ok(Dataset::new(labels, records))
    }

    /// Close the pool, flushing pending writes.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["related".into(), "water".into(), "medical_help".into()],
            vec![
                MessageRecord {
                    id: 2,
                    message: "Weather update - a cold front from Cuba".into(),
                    original: Some("Un front froid se retrouve sur Cuba".into()),
                    genre: "direct".into(),
                    labels: vec![1, 0, 0],
                },
                MessageRecord {
                    id: 8,
                    message: "We need water and medicine".into(),
                    original: None,
                    genre: "news".into(),
                    labels: vec![1, 1, 1],
                },
            ],
        )
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("DisasterResponse.db");

        let store = DatasetStore::create(&path, DEFAULT_TABLE).await.unwrap();
        assert_eq!(store.save(&sample()).await.unwrap(), 2);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_save_replaces_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("replace.db");
        let store = DatasetStore::create(&path, DEFAULT_TABLE).await.unwrap();

        store.save(&sample()).await.unwrap();
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 2);

        let mut record = sample().records[0].clone();
        record.labels = vec![0];
        let smaller = Dataset::new(vec!["offer".into()], vec![record]);
        store.save(&smaller).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.labels, vec!["offer".to_string()]);
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_database() {
        let err = DatasetStore::open("/nonexistent/dir/missing.db", DEFAULT_TABLE)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.db");
        DatasetStore::create(&path, "other").await.unwrap();

        let store = DatasetStore::open(&path, DEFAULT_TABLE).await.unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("dataset").unwrap(), "\"dataset\"");
        assert!(quote_ident("x; DROP TABLE y").is_err());
    }
}
