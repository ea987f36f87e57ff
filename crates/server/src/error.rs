use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{auth::AuthError, tasks::TaskError, users::UserError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Task(err) => match err {
                TaskError::TaskNotFound
                | TaskError::UserNotFound(_)
                | TaskError::DependencyNotFound(_) => StatusCode::NOT_FOUND,
                TaskError::Forbidden(_) => StatusCode::FORBIDDEN,
                TaskError::Validation(_) | TaskError::InvalidDependency(_) => {
                    StatusCode::BAD_REQUEST
                }
                TaskError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::User(err) => match err {
                UserError::NotFound => StatusCode::NOT_FOUND,
                UserError::Conflict => StatusCode::CONFLICT,
                UserError::Validation(_) => StatusCode::BAD_REQUEST,
                UserError::Forbidden(_) => StatusCode::FORBIDDEN,
                UserError::Auth(_) | UserError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(err) => match err {
                AuthError::PasswordHash(_) | AuthError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                AuthError::InvalidCredentials
                | AuthError::InvalidToken(_)
                | AuthError::MalformedSubject
                | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
            },
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Task(TaskError::InvalidDependency(violation)) => {
                format!("Invalid dependency ({}): {violation}", violation.reason())
            }
            ApiError::Auth(AuthError::InvalidCredentials) => "invalid email or password".to_string(),
            ApiError::Auth(_) | ApiError::Unauthorized => "please log in".to_string(),
            ApiError::Json(rejection) => rejection.body_text(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status();
        let error_message = if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.message()
        };

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use services::services::dependencies::DependencyViolation;

    use super::*;

    #[test]
    fn task_errors_map_to_their_status() {
        let cases = [
            (ApiError::from(TaskError::TaskNotFound), StatusCode::NOT_FOUND),
            (
                ApiError::from(TaskError::Forbidden("no".to_string())),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(TaskError::Validation("bad".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(TaskError::from(DependencyViolation::SelfReference)),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(UserError::Conflict), StatusCode::CONFLICT),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn dependency_messages_carry_the_reason() {
        let error = ApiError::from(TaskError::from(DependencyViolation::SelfReference));
        assert_eq!(
            error.message(),
            "Invalid dependency (self): Task cannot depend on itself"
        );
    }
}
