use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A company- and job-title-scoped seniority label (e.g. "L4").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Level {
    pub id: Uuid,
    pub company_id: Uuid,
    pub job_title_id: Uuid,
    pub name: String,
}
