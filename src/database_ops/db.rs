use anyhow::{bail, Result};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    PgPool, SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

/// Backend-specific pool. The host owns the score-history table; which engine
/// it lives in is decided by the DSN scheme.
#[derive(Clone, Debug)]
pub enum DbPool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

#[derive(Clone, Debug)]
pub struct Db {
    pub pool: DbPool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let url = database_url.trim();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            let mut connect_options = PgConnectOptions::from_str(url)?;
            if url.contains("sslmode=require") {
                connect_options = connect_options.ssl_mode(PgSslMode::Require);
            }
            // PgBouncer txn mode safe
            connect_options = connect_options.statement_cache_capacity(0);

            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(600))
                .connect_with(connect_options)
                .await?;
            info!(backend = "postgres", "connected to db");
            return Ok(Self {
                pool: DbPool::Postgres(pool),
            });
        }

        if url.starts_with("sqlite:") {
            if url.contains(":memory:") {
                return Self::connect_sqlite_memory().await;
            }
            let connect_options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .acquire_timeout(Duration::from_secs(10))
                .connect_with(connect_options)
                .await?;
            info!(backend = "sqlite", "connected to db");
            return Ok(Self {
                pool: DbPool::Sqlite(pool),
            });
        }

        bail!("unsupported database url scheme (expected postgres:// or sqlite:)")
    }

    /// Private in-memory SQLite database. A single connection that never idles
    /// out, otherwise the database would vanish between queries.
    pub async fn connect_sqlite_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;
        info!(backend = "sqlite", "connected to in-memory db");
        Ok(Self {
            pool: DbPool::Sqlite(pool),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.pool {
            DbPool::Postgres(_) => "postgres",
            DbPool::Sqlite(_) => "sqlite",
        }
    }

    /// Execute a statement that takes no parameters (DDL, seeding).
    pub async fn execute_raw(&self, sql: &str) -> Result<()> {
        match &self.pool {
            DbPool::Postgres(pool) => {
                sqlx::raw_sql(sql).execute(pool).await?;
            }
            DbPool::Sqlite(pool) => {
                sqlx::raw_sql(sql).execute(pool).await?;
            }
        }
        Ok(())
    }

    /// Cheap connectivity probe.
    pub async fn ping(&self) -> Result<()> {
        match &self.pool {
            DbPool::Postgres(pool) => {
                sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
            }
            DbPool::Sqlite(pool) => {
                sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
            }
        }
        Ok(())
    }
}
