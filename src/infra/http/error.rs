//! JSON error envelope shared by the public API and the admin API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::auth::AuthError;
use crate::application::catalog::CatalogError;
use crate::application::error::{AppError, ErrorReport};
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const AUTH: &str = "auth_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.clone(),
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {}", self.code, self.message),
        )
        .attach(&mut response);
        response
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = err.status_code();
        let (code, message) = match &err {
            AppError::Domain(DomainError::NotFound { .. }) | AppError::NotFound => {
                (codes::NOT_FOUND, "Resource not found".to_string())
            }
            AppError::Domain(DomainError::Validation { message })
            | AppError::Validation(message) => (codes::INVALID_INPUT, message.clone()),
            AppError::Repo(repo) => return repo_to_api(repo, status),
            AppError::Infra(_) | AppError::Unexpected(_) => {
                (codes::REPO, "Unexpected error occurred".to_string())
            }
        };
        Self::new(status, code, message)
    }
}

fn repo_to_api(err: &RepoError, status: StatusCode) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::new(status, codes::NOT_FOUND, "Resource not found"),
        RepoError::Duplicate { constraint } => ApiError::new(
            status,
            codes::DUPLICATE,
            format!("A record with the same unique value already exists ({constraint})"),
        ),
        RepoError::InvalidInput { message } => {
            ApiError::new(status, codes::INVALID_INPUT, message.clone())
        }
        RepoError::Timeout => ApiError::new(status, codes::DB_TIMEOUT, "Database timed out"),
        RepoError::Persistence(_) => {
            ApiError::new(status, codes::REPO, "Storage temporarily unavailable")
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Repo(repo) => AppError::from(repo).into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::unauthorized("Invalid username or password")
            }
            AuthError::TokenMissing => ApiError::unauthorized("Authentication required"),
            AuthError::TokenInvalid => ApiError::unauthorized("Invalid authentication token"),
            AuthError::NotAdmin => ApiError::new(
                StatusCode::FORBIDDEN,
                codes::FORBIDDEN,
                "Token lacks administrative rights",
            ),
            AuthError::TokenExpired => ApiError::unauthorized("Session expired"),
            AuthError::Repo(repo) => AppError::from(repo).into(),
            AuthError::BadHash(_) | AuthError::Signing(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::AUTH,
                "Authentication backend failure",
            ),
        }
    }
}
