use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Industry {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
