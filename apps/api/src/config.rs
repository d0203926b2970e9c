use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Optional: aggregate caching is disabled when unset.
    pub redis_url: Option<String>,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub admin_password: String,
    pub port: u16,
    pub rust_log: String,
    /// Days after a submission during which the submitter can view
    /// individual (non-aggregated) rows.
    pub unlock_window_days: i64,
    /// Groups smaller than this report a count but no stats.
    pub min_group_size: usize,
    pub stats_cache_ttl_secs: u64,
    pub admin_session_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok(),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            admin_password: require_env("ADMIN_PASSWORD")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            unlock_window_days: parse_env_or("UNLOCK_WINDOW_DAYS", 365)?,
            min_group_size: parse_env_or("MIN_GROUP_SIZE", 3)?,
            stats_cache_ttl_secs: parse_env_or("STATS_CACHE_TTL_SECS", 300)?,
            admin_session_hours: parse_env_or("ADMIN_SESSION_HOURS", 12)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}
