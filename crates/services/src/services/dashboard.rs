use db::{
    DBService,
    models::{
        role::Role,
        task::{PriorityCount, StatusCount, Task, TaskDetails, TaskStatus},
        user::User,
    },
};
use serde::Serialize;
use ts_rs::TS;

use super::{
    auth::Principal,
    tasks::{TaskError, TaskQuery, TaskService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    /// Admin-only breakdown, ascending priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_priority: Option<Vec<PriorityCount>>,
}

impl TaskStats {
    pub fn from_counts(counts: &[StatusCount]) -> Self {
        let mut stats = TaskStats::default();
        for entry in counts {
            match entry.status {
                TaskStatus::Pending => stats.pending += entry.count,
                TaskStatus::InProgress => stats.in_progress += entry.count,
                TaskStatus::Completed => stats.completed += entry.count,
            }
            stats.total += entry.count;
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct Dashboard {
    pub user: Principal,
    pub tasks: Vec<TaskDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TaskStats>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: DBService,
    tasks: TaskService,
}

impl DashboardService {
    pub fn new(db: DBService) -> Self {
        Self {
            tasks: TaskService::new(db.clone()),
            db,
        }
    }

    /// Builds the role-shaped landing view. Nothing is cached.
    pub async fn dashboard(&self, principal: &Principal) -> Result<Dashboard, TaskError> {
        let tasks = self.tasks.list(principal, TaskQuery::default()).await?;
        let pool = &self.db.pool;

        let (users, stats) = match principal.role {
            Role::User => (None, None),
            Role::Manager => {
                let users = User::find_by_role(pool, Role::User).await?;
                let stats = TaskStats::from_counts(&Task::count_by_status(pool).await?);
                (Some(users), Some(stats))
            }
            Role::Admin => {
                let users = User::find_all(pool).await?;
                let mut stats = TaskStats::from_counts(&Task::count_by_status(pool).await?);
                stats.by_priority = Some(Task::count_by_priority(pool).await?);
                (Some(users), Some(stats))
            }
        };

        tracing::debug!(
            user_id = %principal.id,
            role = %principal.role,
            tasks = tasks.len(),
            "dashboard built"
        );
        Ok(Dashboard {
            user: principal.clone(),
            tasks,
            users,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_total_is_the_sum_of_status_counts() {
        let stats = TaskStats::from_counts(&[
            StatusCount {
                status: TaskStatus::Pending,
                count: 3,
            },
            StatusCount {
                status: TaskStatus::Completed,
                count: 2,
            },
        ]);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.completed, 2);
        assert!(stats.by_priority.is_none());
    }
}
