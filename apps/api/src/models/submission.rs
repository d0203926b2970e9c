use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub company_id: Uuid,
    pub job_title_id: Uuid,
    pub location_id: Uuid,
    pub level_id: Option<Uuid>,
    pub base_salary: i64,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
    pub currency: String,
    pub years_experience: i32,
    pub years_at_company: i32,
    pub note: Option<String>,
    pub user_id: Option<Uuid>,
    /// Hex SHA-256 of the claim token for anonymous submissions.
    /// Cleared when ownership migrates to a user id.
    #[serde(skip_serializing, default)]
    pub anon_token_hash: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Annual total compensation: base plus bonus and stock where present.
    pub fn total_comp(&self) -> i64 {
        self.base_salary + self.bonus.unwrap_or(0) + self.stock.unwrap_or(0)
    }
}

/// A submission row joined with the display names of its referenced entities,
/// as served by the browse endpoints.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubmissionDetail {
    pub id: Uuid,
    pub company: String,
    pub company_slug: String,
    pub job_title: String,
    pub job_title_slug: String,
    pub city: String,
    pub country: String,
    pub level: Option<String>,
    pub base_salary: i64,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
    pub currency: String,
    pub years_experience: i32,
    pub years_at_company: i32,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
