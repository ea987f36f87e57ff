use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqliteExecutor};
use ts_rs::TS;
use uuid::Uuid;

/// One edge of the dependency graph: `task_id` depends on `depends_on_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct TaskDependency {
    pub task_id: Uuid,
    pub depends_on_id: Uuid,
}

/// Lightweight reference to another task, as rendered in dependency lists.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize, TS)]
pub struct TaskRef {
    pub id: Uuid,
    pub title: String,
}

impl TaskDependency {
    pub async fn find_ids_for_task<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"SELECT depends_on_id FROM task_dependencies
               WHERE task_id = $1
               ORDER BY rowid"#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    pub async fn find_refs_for_task<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: Uuid,
    ) -> Result<Vec<TaskRef>, sqlx::Error> {
        sqlx::query_as::<_, TaskRef>(
            r#"SELECT t.id, t.title
               FROM task_dependencies AS d
               JOIN tasks AS t ON t.id = d.depends_on_id
               WHERE d.task_id = $1
               ORDER BY d.rowid"#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    /// Every stored edge, for whole-graph cycle checks.
    pub async fn find_all<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(
            r#"SELECT task_id, depends_on_id FROM task_dependencies"#,
        )
        .fetch_all(executor)
        .await
    }

    /// Replaces the task's dependency set with `depends_on`.
    pub async fn replace_for_task(
        conn: &mut SqliteConnection,
        task_id: Uuid,
        depends_on: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_dependencies WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        for depends_on_id in depends_on {
            sqlx::query(
                r#"INSERT INTO task_dependencies (task_id, depends_on_id)
                   VALUES ($1, $2)
                   ON CONFLICT DO NOTHING"#,
            )
            .bind(task_id)
            .bind(*depends_on_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
