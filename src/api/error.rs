use crate::api::hierarchy::generics::HierarchyError;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DieselError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] diesel::r2d2::PoolError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                err.to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ApiError::Hierarchy(err) => match err {
                HierarchyError::CyclicHierarchy(_) => {
                    (StatusCode::CONFLICT, "CYCLIC_HIERARCHY", err.to_string())
                }
                HierarchyError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", err.to_string()),
                HierarchyError::EmptyPath => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    err.to_string(),
                ),
                HierarchyError::DatabaseError(db_err) => classify_diesel_error(db_err),
            },
            ApiError::DatabaseError(err) => classify_diesel_error(err),
            ApiError::PoolError(err) => {
                tracing::error!("Connection pool error: {:?}", err);
                internal_error()
            }
            ApiError::InternalServerError(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal_error()
            }
        }
    }
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Missing rows become 404 and unique violations 409; anything else is
/// logged and hidden behind a 500.
fn classify_diesel_error(err: &DieselError) -> (StatusCode, &'static str, String) {
    match err {
        DieselError::NotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!(
                "Duplicate value violates unique constraint: {}",
                info.constraint_name().unwrap_or("unknown")
            ),
        ),
        other => {
            tracing::error!("Database error: {:?}", other);
            internal_error()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}
