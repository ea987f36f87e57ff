use axum::{Extension, Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::{auth::Principal, dashboard::Dashboard};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ResponseJson<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = state.dashboard().dashboard(&principal).await?;
    Ok(ResponseJson(ApiResponse::success(dashboard)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}
