use std::{marker::PhantomData, path::Path, str::FromStr, time::Duration};

use sqlx::{
    migrate::MigrateError,
    query::Query,
    sqlite::{
        SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
        SqliteSynchronous,
    },
    Row, Sqlite, SqlitePool,
};
use thiserror::Error;
use tracing::{debug, info};

use ats_core::{Application, Candidate, IndexField, Position, Record};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// The database file is created when it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url).map_err(StorageError::Connect)?;
        Self::connect_with(options).await
    }

    /// Opens (or creates) the database stored at `path`.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        Self::connect_with(SqliteConnectOptions::new().filename(path)).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self, StorageError> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        info!(stage = "storage", "database migrations applied");
        Ok(())
    }

    /// Returns a handle to the positions collection.
    pub fn positions(&self) -> Collection<Position> {
        Collection::new(self.pool.clone())
    }

    /// Returns a handle to the standalone applications collection.
    pub fn applications(&self) -> Collection<Application> {
        Collection::new(self.pool.clone())
    }

    /// Returns a handle to the candidates collection.
    pub fn candidates(&self) -> Collection<Candidate> {
        Collection::new(self.pool.clone())
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to encode {collection} record: {source}")]
    Encode {
        collection: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to decode {collection} record: {source}")]
    Decode {
        collection: &'static str,
        source: serde_json::Error,
    },
}

/// Direction used by [`Collection::scan_ordered`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Repository over one record collection.
///
/// Each call is atomic for this collection only; nothing spans collections.
pub struct Collection<R> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Collection<R> {
    fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Inserts the record or overwrites the one sharing its id.
    pub async fn put(&self, record: &R) -> Result<(), StorageError> {
        let sql = upsert_sql::<R>();
        bind_record(&sql, record)?.execute(&self.pool).await?;
        Ok(())
    }

    /// Writes a batch of records inside a single transaction.
    pub async fn put_many(&self, records: &[R]) -> Result<(), StorageError> {
        let sql = upsert_sql::<R>();
        let mut tx = self.pool.begin().await?;
        for record in records {
            bind_record(&sql, record)?.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        debug!(
            stage = "storage",
            collection = R::COLLECTION,
            written = records.len(),
            "batch written"
        );
        Ok(())
    }

    /// Loads the record with the given id.
    pub async fn get(&self, id: &str) -> Result<Option<R>, StorageError> {
        let sql = format!("SELECT body_json FROM {} WHERE id = ?", R::COLLECTION);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode_row::<R>).transpose()
    }

    /// Lists records whose index `field` equals `value`.
    pub async fn query_by_field(
        &self,
        field: R::Field,
        value: &str,
    ) -> Result<Vec<R>, StorageError> {
        let sql = format!(
            "SELECT body_json FROM {} WHERE \"{}\" = ? ORDER BY id",
            R::COLLECTION,
            field.column()
        );
        let rows = sqlx::query(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row::<R>).collect()
    }

    /// Returns every record in the collection.
    pub async fn scan_all(&self) -> Result<Vec<R>, StorageError> {
        let sql = format!("SELECT body_json FROM {} ORDER BY id", R::COLLECTION);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row::<R>).collect()
    }

    /// Returns every record sorted by the index `field`, ties broken by id.
    pub async fn scan_ordered(
        &self,
        field: R::Field,
        order: SortOrder,
    ) -> Result<Vec<R>, StorageError> {
        let sql = format!(
            "SELECT body_json FROM {table} ORDER BY \"{column}\" {dir}, id {dir}",
            table = R::COLLECTION,
            column = field.column(),
            dir = order.as_sql()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row::<R>).collect()
    }

    /// Removes the record with the given id, returning how many rows were deleted.
    pub async fn delete(&self, id: &str) -> Result<u64, StorageError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", R::COLLECTION);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Removes every record in the collection.
    pub async fn clear(&self) -> Result<u64, StorageError> {
        let sql = format!("DELETE FROM {}", R::COLLECTION);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        let deleted = result.rows_affected();
        debug!(
            stage = "storage",
            collection = R::COLLECTION,
            deleted,
            "collection cleared"
        );
        Ok(deleted)
    }

    /// Number of records in the collection.
    pub async fn count(&self) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", R::COLLECTION);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total")?;
        Ok(total as u64)
    }
}

fn upsert_sql<R: Record>() -> String {
    let columns: Vec<String> = R::Field::ALL
        .iter()
        .map(|field| format!("\"{}\"", field.column()))
        .collect();
    let placeholders = vec!["?"; columns.len() + 2].join(", ");
    let updates = columns
        .iter()
        .map(|column| format!("{column} = excluded.{column}"))
        .chain(std::iter::once("body_json = excluded.body_json".to_string()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} (id, {columns}, body_json) VALUES ({placeholders}) \
         ON CONFLICT(id) DO UPDATE SET {updates}",
        table = R::COLLECTION,
        columns = columns.join(", "),
    )
}

fn bind_record<'q, R: Record>(
    sql: &'q str,
    record: &R,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>, StorageError> {
    let body = serde_json::to_string(record).map_err(|source| StorageError::Encode {
        collection: R::COLLECTION,
        source,
    })?;

    let mut query = sqlx::query(sql).bind(record.id().to_string());
    for field in R::Field::ALL {
        query = query.bind(record.index_value(*field));
    }
    Ok(query.bind(body))
}

fn decode_row<R: Record>(row: &SqliteRow) -> Result<R, StorageError> {
    let body: String = row.try_get("body_json")?;
    serde_json::from_str(&body).map_err(|source| StorageError::Decode {
        collection: R::COLLECTION,
        source,
    })
}
