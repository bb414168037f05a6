use sqlx::PgPool;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::students::models::Student;

pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All students of a school, ordered by display id
    pub async fn list_by_school(&self, school_id: Uuid) -> Result<Vec<Student>> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT student_id_display, full_name, grade_level, school_id
            FROM students
            WHERE school_id = $1
            ORDER BY student_id_display ASC
            "#,
        )
        .bind(school_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch students: {}", e)))
    }
}
