use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobTitle {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub industry_id: Option<Uuid>,
}
