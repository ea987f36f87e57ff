use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};
use tracing::warn;

use crate::{AppState, error::ApiError};

pub const SESSION_COOKIE: &str = "token";

/// Candidate session tokens: the cookie first, then an `Authorization: Bearer`
/// header.
fn session_tokens(headers: &HeaderMap) -> Vec<String> {
    let cookie = CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let bearer = headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string());
    cookie.into_iter().chain(bearer).collect()
}

/// Accepts the request if any candidate token resolves, so a stale cookie
/// does not shadow a valid bearer header.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut rejection = ApiError::Unauthorized;
    for token in session_tokens(req.headers()) {
        match state.auth().resolve_principal(&token).await {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                return next.run(req).await;
            }
            Err(err) => {
                warn!(?err, "rejected session token");
                rejection = ApiError::from(err);
            }
        }
    }
    rejection.into_response()
}
