use chrono::NaiveDate;
use db::{
    DBService,
    models::{
        role::Role,
        task::{CreateTask, Task, TaskDetails, TaskFilter, TaskStatus, UpdateTask, is_valid_priority},
        task_assignee::TaskAssignee,
        task_comment::TaskComment,
        task_dependency::TaskDependency,
        user::User,
    },
};
use serde::Deserialize;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::Principal,
    authorization::{AccessDenied, Membership, TaskAction, authorize_task, required_owner_role},
    dependencies::{DependencyGraph, DependencyViolation, normalize},
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("User {0} not found")]
    UserNotFound(Uuid),
    #[error("Dependency task {0} not found")]
    DependencyNotFound(Uuid),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    InvalidDependency(#[from] DependencyViolation),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<AccessDenied> for TaskError {
    fn from(denied: AccessDenied) -> Self {
        TaskError::Forbidden(denied.0.to_string())
    }
}

/// Fields of a new task plus the dependency list validated after insertion.
#[derive(Debug, Clone, Deserialize, TS)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub assigned_to: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

/// A creation request tagged with the creator's role. Users cannot build one.
#[derive(Debug, Clone)]
pub enum CreateTaskCommand {
    AsAdmin(NewTask),
    AsManager(NewTask),
}

impl CreateTaskCommand {
    pub fn for_principal(principal: &Principal, task: NewTask) -> Result<Self, TaskError> {
        authorize_task(principal.role, TaskAction::Create, Membership::default())?;
        match principal.role {
            Role::Admin => Ok(CreateTaskCommand::AsAdmin(task)),
            Role::Manager => Ok(CreateTaskCommand::AsManager(task)),
            Role::User => Err(TaskError::Forbidden(
                "Users cannot create or assign tasks".to_string(),
            )),
        }
    }

    fn creator_role(&self) -> Role {
        match self {
            CreateTaskCommand::AsAdmin(_) => Role::Admin,
            CreateTaskCommand::AsManager(_) => Role::Manager,
        }
    }

    fn into_task(self) -> NewTask {
        match self {
            CreateTaskCommand::AsAdmin(task) | CreateTaskCommand::AsManager(task) => task,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub priority: Option<i64>,
}

/// The manager-owned part of a task, replaced as a unit.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskPlan {
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    #[serde(default)]
    pub assigned_users: Vec<Uuid>,
    #[serde(default)]
    pub objectives_text: String,
}

fn validate_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::Validation("Task title is required".to_string()));
    }
    Ok(title.to_string())
}

fn validate_priority(priority: Option<i64>) -> Result<(), TaskError> {
    match priority {
        Some(p) if !is_valid_priority(p) => Err(TaskError::Validation(format!(
            "Priority must be 1 (high), 2 (medium) or 3 (low), got {p}"
        ))),
        _ => Ok(()),
    }
}

fn validate_dates(start: Option<NaiveDate>, due: Option<NaiveDate>) -> Result<(), TaskError> {
    match (start, due) {
        (Some(start), Some(due)) if due < start => Err(TaskError::Validation(
            "Due date cannot be before the start date".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct TaskService {
    db: DBService,
}

impl TaskService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// Takes the write lock at BEGIN; a deferred transaction that reads first
    /// cannot wait on the busy timeout when it later upgrades.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool().begin_with("BEGIN IMMEDIATE").await
    }

    async fn find_task(&self, task_id: Uuid) -> Result<Task, TaskError> {
        Task::find_by_id(self.pool(), task_id)
            .await?
            .ok_or(TaskError::TaskNotFound)
    }

    async fn membership(&self, task: &Task, principal: &Principal) -> Result<Membership, TaskError> {
        Ok(Membership {
            is_owner: task.assigned_to == Some(principal.id),
            is_worker: TaskAssignee::is_assigned(self.pool(), task.id, principal.id).await?,
        })
    }

    /// Loads the task and checks `action` against the principal in one go.
    async fn authorized_task(
        &self,
        principal: &Principal,
        task_id: Uuid,
        action: TaskAction,
    ) -> Result<Task, TaskError> {
        let task = self.find_task(task_id).await?;
        let membership = self.membership(&task, principal).await?;
        authorize_task(principal.role, action, membership)?;
        Ok(task)
    }

    async fn details(&self, task: Task) -> Result<TaskDetails, TaskError> {
        Ok(TaskDetails::load(self.pool(), task).await?)
    }

    /// Resolves a prospective owner and checks it has the role the assigner
    /// is allowed to hand tasks to.
    async fn check_owner(&self, assigner: Role, owner_id: Uuid) -> Result<(), TaskError> {
        let owner = User::find_by_id(self.pool(), owner_id)
            .await?
            .ok_or(TaskError::UserNotFound(owner_id))?;
        match required_owner_role(assigner) {
            Some(required) if owner.role == required => Ok(()),
            Some(required) => Err(TaskError::Forbidden(format!(
                "A task assigned by a {assigner} must be owned by a {required}, not a {}",
                owner.role
            ))),
            None => Err(TaskError::Forbidden(
                "Users cannot create or assign tasks".to_string(),
            )),
        }
    }

    pub async fn create(&self, command: CreateTaskCommand) -> Result<TaskDetails, TaskError> {
        let creator_role = command.creator_role();
        let new_task = command.into_task();

        let title = validate_title(&new_task.title)?;
        validate_priority(new_task.priority)?;
        validate_dates(new_task.start_date, new_task.due_date)?;
        if let Some(owner_id) = new_task.assigned_to {
            self.check_owner(creator_role, owner_id).await?;
        }

        let data = CreateTask {
            title,
            description: new_task.description,
            priority: new_task.priority,
            assigned_to: new_task.assigned_to,
            start_date: new_task.start_date,
            due_date: new_task.due_date,
        };

        let mut tx = self.begin_write().await?;
        let task = Task::create(&mut *tx, &data, Uuid::new_v4()).await?;

        if !new_task.dependencies.is_empty() {
            match check_dependencies(&mut tx, task.id, &new_task.dependencies).await {
                Ok(dependencies) => {
                    TaskDependency::replace_for_task(&mut tx, task.id, &dependencies).await?;
                }
                Err(err) => {
                    tx.rollback().await?;
                    tracing::warn!(title = %task.title, %err, "task creation rolled back");
                    return Err(err);
                }
            }
        }

        tx.commit().await?;
        tracing::info!(task_id = %task.id, %creator_role, "task created");
        self.details(task).await
    }

    /// Lists tasks visible to the principal: users only see tasks they own or
    /// work on, managers and admins see everything.
    pub async fn list(
        &self,
        principal: &Principal,
        query: TaskQuery,
    ) -> Result<Vec<TaskDetails>, TaskError> {
        authorize_task(principal.role, TaskAction::List, Membership::default())?;
        validate_priority(query.priority)?;

        let filter = TaskFilter {
            search: query.search,
            priority: query.priority,
            member: (principal.role == Role::User).then_some(principal.id),
        };
        let tasks = Task::find_filtered(self.pool(), &filter).await?;
        Ok(TaskDetails::load_many(self.pool(), tasks).await?)
    }

    /// Tasks where the principal is the owner or a worker, whatever the role.
    pub async fn list_assigned(&self, principal: &Principal) -> Result<Vec<TaskDetails>, TaskError> {
        let filter = TaskFilter {
            member: Some(principal.id),
            ..Default::default()
        };
        let tasks = Task::find_filtered(self.pool(), &filter).await?;
        Ok(TaskDetails::load_many(self.pool(), tasks).await?)
    }

    pub async fn get(&self, principal: &Principal, task_id: Uuid) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::View)
            .await?;
        self.details(task).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        task_id: Uuid,
        mut data: UpdateTask,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdateCore)
            .await?;

        if let Some(title) = data.title.as_deref() {
            data.title = Some(validate_title(title)?);
        }
        validate_priority(data.priority)?;
        validate_dates(
            data.start_date.or(task.start_date),
            data.due_date.or(task.due_date),
        )?;
        if let Some(owner_id) = data.assigned_to {
            if principal.role != Role::Admin {
                return Err(TaskError::Forbidden(
                    "Only admins can reassign a task's owner".to_string(),
                ));
            }
            self.check_owner(principal.role, owner_id).await?;
        }

        let task = Task::update(self.pool(), task.id, &data)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        tracing::info!(task_id = %task.id, user_id = %principal.id, "task updated");
        self.details(task).await
    }

    pub async fn delete(&self, principal: &Principal, task_id: Uuid) -> Result<(), TaskError> {
        authorize_task(principal.role, TaskAction::Delete, Membership::default())?;
        if Task::delete(self.pool(), task_id).await? == 0 {
            return Err(TaskError::TaskNotFound);
        }
        tracing::info!(%task_id, user_id = %principal.id, "task deleted");
        Ok(())
    }

    pub async fn update_dependencies(
        &self,
        principal: &Principal,
        task_id: Uuid,
        dependencies: Vec<Uuid>,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdatePlan)
            .await?;

        let mut tx = self.begin_write().await?;
        let dependencies = check_dependencies(&mut tx, task.id, &dependencies).await?;
        TaskDependency::replace_for_task(&mut tx, task.id, &dependencies).await?;
        Task::touch(&mut *tx, task.id).await?;
        tx.commit().await?;

        tracing::info!(%task_id, count = dependencies.len(), "dependencies replaced");
        self.details(task).await
    }

    /// Replaces the worker set. Duplicate ids collapse.
    pub async fn set_assigned_users(
        &self,
        principal: &Principal,
        task_id: Uuid,
        user_ids: Vec<Uuid>,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdatePlan)
            .await?;

        let mut tx = self.begin_write().await?;
        let workers = check_workers(&mut tx, &user_ids).await?;
        TaskAssignee::replace_for_task(&mut tx, task.id, &workers).await?;
        Task::touch(&mut *tx, task.id).await?;
        tx.commit().await?;

        tracing::info!(%task_id, count = workers.len(), "workers replaced");
        self.details(task).await
    }

    /// Attaches one worker. Attaching someone already on the task is a no-op.
    pub async fn assign_user(
        &self,
        principal: &Principal,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdatePlan)
            .await?;

        let mut conn = self.pool().acquire().await?;
        check_workers(&mut conn, &[user_id]).await?;
        if TaskAssignee::add(&mut *conn, task.id, user_id).await? {
            Task::touch(&mut *conn, task.id).await?;
            tracing::info!(%task_id, %user_id, "worker assigned");
        }
        drop(conn);

        self.details(task).await
    }

    pub async fn update_objectives(
        &self,
        principal: &Principal,
        task_id: Uuid,
        objectives_text: String,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdatePlan)
            .await?;
        let task = Task::update_objectives(self.pool(), task.id, &objectives_text)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        self.details(task).await
    }

    /// Replaces dependencies, workers and objectives together; either all
    /// three are written or none is.
    pub async fn update_plan(
        &self,
        principal: &Principal,
        task_id: Uuid,
        plan: TaskPlan,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdatePlan)
            .await?;

        let mut tx = self.begin_write().await?;
        let dependencies = check_dependencies(&mut tx, task.id, &plan.dependencies).await?;
        let workers = check_workers(&mut tx, &plan.assigned_users).await?;
        TaskDependency::replace_for_task(&mut tx, task.id, &dependencies).await?;
        TaskAssignee::replace_for_task(&mut tx, task.id, &workers).await?;
        let task = Task::update_objectives(&mut *tx, task.id, &plan.objectives_text)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        tx.commit().await?;

        tracing::info!(
            %task_id,
            dependencies = dependencies.len(),
            workers = workers.len(),
            "task plan updated"
        );
        self.details(task).await
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<TaskDetails, TaskError> {
        let task = self
            .authorized_task(principal, task_id, TaskAction::UpdateStatus)
            .await?;
        let task = Task::update_status(self.pool(), task.id, status)
            .await?
            .ok_or(TaskError::TaskNotFound)?;
        tracing::info!(%task_id, %status, user_id = %principal.id, "task status changed");
        self.details(task).await
    }

    /// Appends a comment and returns only the new entry.
    pub async fn add_comment(
        &self,
        principal: &Principal,
        task_id: Uuid,
        text: &str,
    ) -> Result<TaskComment, TaskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::Validation("Comment text is required".to_string()));
        }

        let task = self
            .authorized_task(principal, task_id, TaskAction::Comment)
            .await?;
        let comment =
            TaskComment::create(self.pool(), task.id, principal.id, text, Uuid::new_v4()).await?;
        Ok(comment)
    }
}

/// Normalizes `proposed` and validates it against the stored graph, returning
/// the set to persist.
async fn check_dependencies(
    conn: &mut SqliteConnection,
    task_id: Uuid,
    proposed: &[Uuid],
) -> Result<Vec<Uuid>, TaskError> {
    let dependencies = normalize(proposed);
    if dependencies.contains(&task_id) {
        return Err(DependencyViolation::SelfReference.into());
    }

    let existing = Task::find_existing_ids(&mut *conn, &dependencies).await?;
    if let Some(missing) = dependencies.iter().find(|id| !existing.contains(id)) {
        return Err(TaskError::DependencyNotFound(*missing));
    }

    DependencyGraph::load(conn)
        .await?
        .validate(task_id, &dependencies)?;
    Ok(dependencies)
}

/// Workers must exist and hold the `user` role.
async fn check_workers(
    conn: &mut SqliteConnection,
    proposed: &[Uuid],
) -> Result<Vec<Uuid>, TaskError> {
    let workers = normalize(proposed);
    let users = User::find_many(&mut *conn, &workers).await?;

    for worker in &workers {
        match users.iter().find(|user| user.id == *worker) {
            None => return Err(TaskError::UserNotFound(*worker)),
            Some(user) if user.role != Role::User => {
                return Err(TaskError::Forbidden(format!(
                    "Only users can be attached as workers; {} is a {}",
                    user.name, user.role
                )));
            }
            Some(_) => {}
        }
    }
    Ok(workers)
}
