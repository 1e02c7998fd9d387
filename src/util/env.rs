//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::debug;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to Cargo project root
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        if dotenv::from_filename(&candidate).is_ok() {
            debug!(target = "env", path = %candidate, "loaded .env from project root");
        }
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Optional parsed value.
pub fn env_parse_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    init_env();
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Database URL, tried from the most specific variable to the generic one.
pub fn db_url() -> anyhow::Result<String> {
    env_opt("FOOTBALLPOOL_DB_URL")
        .or_else(|| env_opt("DATABASE_URL"))
        .ok_or_else(|| anyhow::anyhow!("missing env var DATABASE_URL (or FOOTBALLPOOL_DB_URL)"))
}

/// Runtime settings for the score-history store.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub table_prefix: String,
    pub score_table: String,
    pub max_connections: u32,
}

impl Settings {
    pub const DEFAULT_PREFIX: &'static str = "pool_";
    pub const DEFAULT_SCORE_TABLE: &'static str = "scorehistory";

    /// Gather settings from the environment (after loading .env). An explicit
    /// database URL (e.g. a CLI flag) takes precedence over the environment.
    pub fn resolve(database_url: Option<String>) -> anyhow::Result<Self> {
        let database_url = match database_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => db_url()?,
        };
        Ok(Self {
            database_url,
            table_prefix: env_opt("FOOTBALLPOOL_DB_PREFIX")
                .unwrap_or_else(|| Self::DEFAULT_PREFIX.to_string()),
            score_table: env_opt("FOOTBALLPOOL_SCORE_TABLE")
                .unwrap_or_else(|| Self::DEFAULT_SCORE_TABLE.to_string()),
            max_connections: env_parse("DB_MAX_CONNS", 5u32),
        })
    }

    /// Fully qualified score-history table name (prefix + table).
    pub fn score_table_name(&self) -> String {
        format!("{}{}", self.table_prefix, self.score_table)
    }
}
