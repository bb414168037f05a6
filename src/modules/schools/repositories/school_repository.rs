use sqlx::PgPool;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::schools::models::School;

/// Read-only access to tenant schools
pub struct SchoolRepository {
    pool: PgPool,
}

impl SchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<School>> {
        sqlx::query_as::<_, School>(
            r#"
            SELECT id, name, location, logo_url
            FROM schools
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    /// Like `find_by_id`, but a missing school is a `NotFound` error
    pub async fn get(&self, id: Uuid) -> Result<School> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("School '{}' not found", id)))
    }
}
