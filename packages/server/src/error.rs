use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use mq::{JobError, MqError};
use sea_orm::DbErr;
use serde::Serialize;
use worker::WorkerError;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_INVALID`,
    /// `NOT_FOUND`, `UPSTREAM_ERROR`, `UNAVAILABLE`, `INTERNAL_ERROR`.
    pub code: &'static str,
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// The platform rejected the access token supplied with the request.
    TokenInvalid(String),
    NotFound(String),
    /// The Graph API failed after retries.
    Upstream(String),
    /// The job queue is shut down or dropped the job.
    Unavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenInvalid(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "UPSTREAM_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "UNAVAILABLE",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<WorkerError> for AppError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::Validation(msg) => AppError::Validation(msg),
            WorkerError::MissingCredentials(_) => AppError::Validation(err.to_string()),
            WorkerError::TenantNotFound(id) => {
                AppError::NotFound(format!("Tenant '{id}' not found"))
            }
            WorkerError::Api(e) if e.is_authorization() => AppError::TokenInvalid(e.to_string()),
            WorkerError::Api(e) => AppError::Upstream(e.to_string()),
            WorkerError::Storage(e) => e.into(),
            WorkerError::Mq(MqError::Closed) => {
                AppError::Unavailable("Job queue is shut down".into())
            }
            WorkerError::Mq(e) => AppError::Internal(e.to_string()),
            WorkerError::Job(e @ JobError::Failed { .. }) => AppError::Upstream(e.to_string()),
            WorkerError::Job(e) => AppError::Unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use api_client::ApiError;
    use common::platform::Platform;

    use super::*;

    fn status_of(err: WorkerError) -> (StatusCode, &'static str) {
        let (status, body) = AppError::from(err).status_and_body();
        (status, body.code)
    }

    #[test]
    fn worker_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(WorkerError::Validation("parent_id is required".into())),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
        assert_eq!(
            status_of(WorkerError::MissingCredentials(Platform::Facebook)),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );
        assert_eq!(
            status_of(WorkerError::TenantNotFound("t9".into())),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            status_of(WorkerError::Mq(MqError::Closed)),
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        );
        assert_eq!(
            status_of(WorkerError::Storage(StorageError::Backend("down".into()))),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn api_errors_split_on_authorization() {
        let expired = ApiError::Unauthorized {
            status: 400,
            code: Some(190),
            message: "expired".into(),
        };
        assert_eq!(
            status_of(WorkerError::Api(expired)),
            (StatusCode::UNAUTHORIZED, "TOKEN_INVALID")
        );

        let outage = ApiError::Server {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(
            status_of(WorkerError::Api(outage)),
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        let (_, body) = AppError::Internal("connection refused".into()).status_and_body();
        assert_eq!(body.message, "An unexpected error occurred");
    }
}
