use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant school; only the fields printed on receipts are loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub logo_url: Option<String>,
}
