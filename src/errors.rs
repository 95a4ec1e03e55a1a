//! # Error Handling
//!
//! Every handler returns `Result<_, ApiError>`. Errors map to an HTTP status
//! and a sanitized JSON body:
//!
//! ```json
//! {"error": "Invalid id", "errorKey": "idnull"}
//! ```
//!
//! Database error details are logged with `tracing` and never sent to the
//! client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use std::fmt;

use crate::filter::FilterParseError;
use crate::sort::SortError;

/// Alert key: a create request carried an id.
pub const ID_EXISTS: &str = "idexists";
/// Alert key: an update request carried no id.
pub const ID_NULL: &str = "idnull";
/// Alert key: the body id does not match the path id.
pub const ID_INVALID: &str = "idinvalid";
/// Alert key: the entity to update does not exist.
pub const ID_NOT_FOUND: &str = "idnotfound";

#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// 400 Bad Request, optionally tagged with an alert key such as `idnull`
    BadRequest {
        message: String,
        error_key: Option<&'static str>,
    },

    /// 400 Bad Request with one message per failed check
    ValidationFailed { errors: Vec<String> },

    /// 500, details logged only
    Database { message: String, internal: DbErr },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            error_key: None,
        }
    }

    /// Bad request carrying one of the alert keys ([`ID_EXISTS`], [`ID_NULL`], ...).
    pub fn bad_request_with_key(message: impl Into<String>, error_key: &'static str) -> Self {
        Self::BadRequest {
            message: message.into(),
            error_key: Some(error_key),
        }
    }

    #[must_use]
    pub fn validation_failed(errors: Vec<String>) -> Self {
        Self::ValidationFailed { errors }
    }

    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } | Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn error_key(&self) -> Option<&'static str> {
        match self {
            Self::BadRequest { error_key, .. } => *error_key,
            _ => None,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message, .. } | Self::Database { message, .. } => message.clone(),
            Self::ValidationFailed { errors } => match errors.as_slice() {
                [single] => single.clone(),
                _ => format!("Validation failed: {}", errors.join(", ")),
            },
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match &self {
            Self::ValidationFailed { errors } => ErrorResponse {
                error: "Validation failed".to_string(),
                error_key: None,
                details: Some(errors.clone()),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                error_key: self.error_key(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// `DbErr::RecordNotFound` becomes 404 and a foreign key violation (a body
/// referencing a missing row) becomes 400. Every other database error is a
/// sanitized 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::ForeignKeyConstraintViolation(details)) = err.sql_err() {
            tracing::debug!(%details, "Foreign key violation");
            return Self::bad_request("Referenced entity does not exist");
        }
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            _ => Self::database(err),
        }
    }
}

impl From<FilterParseError> for ApiError {
    fn from(err: FilterParseError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<SortError> for ApiError {
    fn from(err: SortError) -> Self {
        Self::bad_request(err.to_string())
    }
}
