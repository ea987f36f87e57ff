use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    task_assignee::TaskAssignee,
    task_comment::TaskComment,
    task_dependency::{TaskDependency, TaskRef},
    user::{User, UserSummary},
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    TS,
    Display,
    EnumString,
)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

pub const PRIORITY_HIGH: i64 = 1;
pub const PRIORITY_MEDIUM: i64 = 2;
pub const PRIORITY_LOW: i64 = 3;

pub fn is_valid_priority(priority: i64) -> bool {
    (PRIORITY_HIGH..=PRIORITY_LOW).contains(&priority)
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: i64,
    pub assigned_to: Option<Uuid>,
    pub objectives_text: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub assigned_to: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<i64>,
    pub assigned_to: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    pub priority: Option<i64>,
    /// Restrict to tasks where this user is owner or worker.
    pub member: Option<Uuid>,
}

/// A task with its owner, workers, dependencies and comments resolved.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub owner: Option<UserSummary>,
    pub assigned_users: Vec<UserSummary>,
    pub dependencies: Vec<TaskRef>,
    pub comments: Vec<TaskComment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize, TS)]
pub struct PriorityCount {
    pub priority: i64,
    pub count: i64,
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, assigned_to, objectives_text, \
     start_date, due_date, created_at, updated_at";

impl Task {
    pub async fn find_by_id<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            r#"SELECT {TASK_COLUMNS}
               FROM tasks AS t
               WHERE ($1 IS NULL OR t.priority = $1)
                 AND ($2 IS NULL
                      OR t.assigned_to = $2
                      OR EXISTS (SELECT 1 FROM task_assignees AS a
                                 WHERE a.task_id = t.id AND a.user_id = $2))
               ORDER BY t.created_at DESC"#
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(filter.priority)
            .bind(filter.member)
            .fetch_all(pool)
            .await?;

        // SQLite's lower() only folds ASCII, so the text match happens here.
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Ok(match needle {
            Some(needle) => tasks
                .into_iter()
                .filter(|task| task.matches_search(&needle))
                .collect(),
            None => tasks,
        })
    }

    /// `needle` must already be lower-cased.
    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(needle))
    }

    /// Returns which of `ids` exist in the task table.
    pub async fn find_existing_ids<'e, E: SqliteExecutor<'e>>(
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT id FROM tasks WHERE id IN ({placeholders})");
        let mut query = sqlx::query_scalar::<_, Uuid>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        query.fetch_all(executor).await
    }

    pub async fn create<'e, E: SqliteExecutor<'e>>(
        executor: E,
        data: &CreateTask,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Task>(&format!(
            r#"INSERT INTO tasks (id, title, description, priority, assigned_to,
                                  start_date, due_date, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority.unwrap_or(PRIORITY_LOW))
        .bind(data.assigned_to)
        .bind(data.start_date)
        .bind(data.due_date)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks
               SET title       = COALESCE($2, title),
                   description = COALESCE($3, description),
                   status      = COALESCE($4, status),
                   priority    = COALESCE($5, priority),
                   assigned_to = COALESCE($6, assigned_to),
                   start_date  = COALESCE($7, start_date),
                   due_date    = COALESCE($8, due_date),
                   updated_at  = $9
               WHERE id = $1
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assigned_to)
        .bind(data.start_date)
        .bind(data.due_date)
        .bind(Utc::now())
        .fetch_optional(executor)
        .await
    }

    pub async fn update_status<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks SET status = $2, updated_at = $3
               WHERE id = $1
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(executor)
        .await
    }

    pub async fn update_objectives<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: Uuid,
        objectives_text: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"UPDATE tasks SET objectives_text = $2, updated_at = $3
               WHERE id = $1
               RETURNING {TASK_COLUMNS}"#
        ))
        .bind(id)
        .bind(objectives_text)
        .bind(Utc::now())
        .fetch_optional(executor)
        .await
    }

    /// Bumps `updated_at` after a change to one of the task's child tables.
    pub async fn touch<'e, E: SqliteExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<StatusCount>, sqlx::Error> {
        let rows: Vec<(TaskStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    pub async fn count_by_priority(pool: &SqlitePool) -> Result<Vec<PriorityCount>, sqlx::Error> {
        sqlx::query_as::<_, PriorityCount>(
            "SELECT priority, COUNT(*) AS count FROM tasks GROUP BY priority ORDER BY priority",
        )
        .fetch_all(pool)
        .await
    }
}

impl TaskDetails {
    pub async fn load(pool: &SqlitePool, task: Task) -> Result<Self, sqlx::Error> {
        let owner = match task.assigned_to {
            Some(owner_id) => User::find_by_id(pool, owner_id)
                .await?
                .map(UserSummary::from),
            None => None,
        };
        let assigned_users = TaskAssignee::find_users_for_task(pool, task.id).await?;
        let dependencies = TaskDependency::find_refs_for_task(pool, task.id).await?;
        let comments = TaskComment::find_for_task(pool, task.id).await?;

        Ok(TaskDetails {
            task,
            owner,
            assigned_users,
            dependencies,
            comments,
        })
    }

    pub async fn load_many(pool: &SqlitePool, tasks: Vec<Task>) -> Result<Vec<Self>, sqlx::Error> {
        let mut details = Vec::with_capacity(tasks.len());
        for task in tasks {
            details.push(Self::load(pool, task).await?);
        }
        Ok(details)
    }

    pub fn dependency_ids(&self) -> Vec<Uuid> {
        self.dependencies.iter().map(|dep| dep.id).collect()
    }

    pub fn assigned_user_ids(&self) -> Vec<Uuid> {
        self.assigned_users.iter().map(|user| user.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_range() {
        assert!(is_valid_priority(PRIORITY_HIGH));
        assert!(is_valid_priority(PRIORITY_MEDIUM));
        assert!(is_valid_priority(PRIORITY_LOW));
        assert!(!is_valid_priority(0));
        assert!(!is_valid_priority(4));
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: "Überprüfung".to_string(),
            description: Some("ÉTAT DES LIEUX".to_string()),
            status: TaskStatus::Pending,
            priority: PRIORITY_LOW,
            assigned_to: None,
            objectives_text: String::new(),
            start_date: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        };
        assert!(task.matches_search("überprüfung"));
        assert!(task.matches_search("état"));
        assert!(!task.matches_search("prüfungen"));
    }
}
