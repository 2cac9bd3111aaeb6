use crate::db::schema::SQLITE_INIT;
use crate::error::WalletError;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub type SqlitePool = Pool<Sqlite>;

/// How long a writer waits for the database lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared handle to the wallet database.
#[derive(Clone)]
pub struct WalletStorage {
    pool: SqlitePool,
}

impl WalletStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` with foreign keys enforced.
    pub async fn connect(database_url: &str) -> Result<Self, WalletError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), WalletError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        debug!("database schema initialized");
        Ok(())
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, WalletError> {
        Ok(self.pool.acquire().await?)
    }

    /// Start a transaction holding the write lock from its first statement.
    /// Dropping it without `commit` rolls back.
    ///
    /// Concurrent writers queue on `BEGIN IMMEDIATE` instead of failing to
    /// upgrade a deferred read snapshot, so each one sees the rows committed
    /// before it.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, WalletError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}
