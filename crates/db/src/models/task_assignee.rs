use sqlx::{SqliteConnection, SqliteExecutor};
use uuid::Uuid;

use super::user::UserSummary;

/// Worker membership rows (`task_assignees`), distinct from the task owner.
pub struct TaskAssignee;

impl TaskAssignee {
    pub async fn find_users_for_task<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: Uuid,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"SELECT u.id, u.name, u.email
               FROM task_assignees AS a
               JOIN users AS u ON u.id = a.user_id
               WHERE a.task_id = $1
               ORDER BY a.rowid"#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    pub async fn is_assigned<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM task_assignees WHERE task_id = $1 AND user_id = $2"#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(count > 0)
    }

    /// Adds one worker. Returns `false` when the user was already attached.
    pub async fn add<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"INSERT INTO task_assignees (task_id, user_id)
               VALUES ($1, $2)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(task_id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn replace_for_task(
        conn: &mut SqliteConnection,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        for user_id in user_ids {
            Self::add(&mut *conn, task_id, *user_id).await?;
        }
        Ok(())
    }
}
