pub mod auth;

pub use auth::{SESSION_COOKIE, require_session};
