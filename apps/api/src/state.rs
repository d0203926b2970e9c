use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use reqwest::Client as HttpClient;
use sqlx::PgPool;

use crate::browse::cache::StatsCache;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Outbound HTTP client, used for logo fetch-by-URL.
    pub http: HttpClient,
    /// Pluggable aggregate-stats cache. Redis-backed when REDIS_URL is set,
    /// no-op otherwise.
    pub cache: Arc<dyn StatsCache>,
    pub config: Config,
}
