use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use axum_extra::extract::WithRejection;
use db::models::user::User;
use serde::Deserialize;
use services::services::{auth::Principal, users::NewUser};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, TS)]
pub struct PromoteUser {
    pub role: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.users().list(&principal).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    WithRejection(Json(payload), _): WithRejection<Json<NewUser>, ApiError>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    let user = state.users().create_with_role(&principal, payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(user, "User created")),
    ))
}

pub async fn promote_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
    WithRejection(Json(payload), _): WithRejection<Json<PromoteUser>, ApiError>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = state
        .users()
        .promote(&principal, user_id, &payload.role)
        .await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        user,
        "User role updated",
    )))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.users().delete(&principal, user_id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "User deleted",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{user_id}/role", put(promote_user))
        .route("/users/{user_id}", delete(delete_user))
}
