use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A comment row joined with its author's name. `author_id` is `None` once
/// the author account has been deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub text: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

impl TaskComment {
    pub async fn find_for_task(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(
            r#"SELECT c.id, c.task_id, c.author_id, u.name AS author_name, c.text, c.created_at
               FROM task_comments AS c
               LEFT JOIN users AS u ON u.id = c.author_id
               WHERE c.task_id = $1
               ORDER BY c.created_at, c.rowid"#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(
            r#"SELECT c.id, c.task_id, c.author_id, u.name AS author_name, c.text, c.created_at
               FROM task_comments AS c
               LEFT JOIN users AS u ON u.id = c.author_id
               WHERE c.id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Appends a comment. Comments are never updated or deleted individually.
    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        author_id: Uuid,
        text: &str,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO task_comments (id, task_id, author_id, text, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(task_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
