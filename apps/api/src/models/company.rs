use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    /// S3 object key of the company logo, if one has been uploaded.
    pub logo_key: Option<String>,
    pub created_at: DateTime<Utc>,
}
