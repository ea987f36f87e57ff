use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::post,
};
use axum_extra::extract::{
    CookieJar, WithRejection,
    cookie::{Cookie, SameSite},
};
use db::models::user::User;
use serde::{Deserialize, Serialize};
use services::services::users::Registration;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::SESSION_COOKIE};

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

fn session_cookie(token: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<Registration>, ApiError>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    let user = state.users().register(payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(user, "User registered")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<LoginResponse>>), ApiError> {
    let session = state.auth().login(&payload.email, &payload.password).await?;
    let cookie = session_cookie(
        session.token.clone(),
        state.auth().session_ttl(),
        state.config().secure_cookies,
    );

    Ok((
        jar.add(cookie),
        ResponseJson(ApiResponse::success_with_message(
            LoginResponse {
                token: session.token,
                user: session.user,
            },
            "Login successful",
        )),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, ResponseJson<ApiResponse<()>>) {
    let removal = Cookie::build(SESSION_COOKIE).path("/");
    (
        jar.remove(removal),
        ResponseJson(ApiResponse::success_with_message((), "Logged out")),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}
