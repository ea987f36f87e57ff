use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, middleware::require_session};

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod tasks;
pub mod users;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(dashboard::router())
        .merge(users::router())
        .merge(tasks::router())
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let api = Router::new().merge(auth::router()).merge(protected);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
