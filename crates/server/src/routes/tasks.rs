use std::str::FromStr;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use db::models::{
    task::{TaskDetails, TaskStatus, UpdateTask},
    task_comment::TaskComment,
};
use serde::Deserialize;
use services::services::{
    auth::Principal,
    tasks::{CreateTaskCommand, NewTask, TaskError, TaskPlan, TaskQuery},
};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

type TaskResponse = ResponseJson<ApiResponse<TaskDetails>>;

/// Raw list parameters. Browsers send `?priority=` for "any".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub priority: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<TaskQuery, TaskError> {
        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                TaskError::Validation(format!("Priority must be a number, got `{raw}`"))
            })?),
        };
        Ok(TaskQuery {
            search: self.search,
            priority,
        })
    }
}

#[derive(Debug, Deserialize, TS)]
pub struct DependenciesBody {
    pub dependencies: Vec<Uuid>,
}

#[derive(Debug, Deserialize, TS)]
pub struct AssignedUsersBody {
    pub assigned_users: Vec<Uuid>,
}

#[derive(Debug, Deserialize, TS)]
pub struct AssignUserBody {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, TS)]
pub struct ObjectivesBody {
    pub objectives_text: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct CommentBody {
    pub text: String,
}

pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskDetails>>>, ApiError> {
    let tasks = state
        .tasks()
        .list(&principal, params.into_query()?)
        .await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_assigned_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskDetails>>>, ApiError> {
    let tasks = state.tasks().list_assigned(&principal).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    WithRejection(Json(payload), _): WithRejection<Json<NewTask>, ApiError>,
) -> Result<(StatusCode, TaskResponse), ApiError> {
    let command = CreateTaskCommand::for_principal(&principal, payload)?;
    let task = state.tasks().create(command).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(task, "Task created")),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
) -> Result<TaskResponse, ApiError> {
    let task = state.tasks().get(&principal, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateTask>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let task = state.tasks().update(&principal, task_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        task,
        "Task updated",
    )))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.tasks().delete(&principal, task_id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Task deleted",
    )))
}

pub async fn update_dependencies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<DependenciesBody>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let task = state
        .tasks()
        .update_dependencies(&principal, task_id, payload.dependencies)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<TaskPlan>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let task = state
        .tasks()
        .update_plan(&principal, task_id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn set_assigned_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<AssignedUsersBody>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let task = state
        .tasks()
        .set_assigned_users(&principal, task_id, payload.assigned_users)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_objectives(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<ObjectivesBody>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let task = state
        .tasks()
        .update_objectives(&principal, task_id, payload.objectives_text)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn assign_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<AssignUserBody>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let task = state
        .tasks()
        .assign_user(&principal, task_id, payload.user_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<StatusBody>, ApiError>,
) -> Result<TaskResponse, ApiError> {
    let status = TaskStatus::from_str(payload.status.trim())
        .map_err(|_| TaskError::Validation("Invalid status".to_string()))?;
    let task = state
        .tasks()
        .update_status(&principal, task_id, status)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(task_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<CommentBody>, ApiError>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskComment>>), ApiError> {
    let comment = state
        .tasks()
        .add_comment(&principal, task_id, &payload.text)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(comment, "Comment added")),
    ))
}

pub fn router() -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/dependencies", put(update_dependencies))
        .route("/plan", put(update_plan))
        .route("/assigned-users", put(set_assigned_users))
        .route("/objectives", put(update_objectives))
        .route("/assign", post(assign_user))
        .route("/status", put(update_status))
        .route("/comments", post(add_comment));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/assigned", get(get_assigned_tasks))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
