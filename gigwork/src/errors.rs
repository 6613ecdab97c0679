use crate::db::errors::{DbError, StorageError};
use crate::verification::errors::WorkflowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or the token is no longer valid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// The caller is authenticated but may not perform the operation
    #[error("Forbidden: {message}")]
    InsufficientPermissions { message: String },

    /// Rejected input; `field` names the offending request field when there is one
    #[error("{message}")]
    BadRequest { message: String, field: Option<&'static str> },

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflict with existing state, e.g. a duplicate e-mail address
    #[error("Conflict: {message}")]
    Conflict { message: String, field: Option<&'static str> },

    /// Request body exceeds the configured limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    #[error("Failed to {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
            field: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation(_) => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation(_) => StatusCode::BAD_REQUEST,
                DbError::CheckViolation(_) => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to clients. Server-side failures are reduced to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { message } => message.clone(),
            Error::BadRequest { message, .. } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message, .. } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation(_) => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation(_) => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation(_) => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl From<WorkflowError> for Error {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation { field, message } => Error::BadRequest { message, field },
            WorkflowError::DuplicateIdentifier { field } => Error::Conflict {
                message: format!("An account with this {} already exists", field.replace('_', " ")),
                field: Some(field),
            },
            WorkflowError::NotFound { resource, id } => Error::NotFound {
                resource: resource.to_string(),
                id,
            },
            WorkflowError::AlreadyWorker { .. } => Error::Conflict {
                message: "This account is already registered as a worker".to_string(),
                field: None,
            },
            WorkflowError::Authorization { message } => Error::InsufficientPermissions { message },
            WorkflowError::Storage(StorageError::InvalidKey(key)) => Error::Internal {
                operation: format!("resolve stored file {key}"),
            },
            WorkflowError::Storage(e) => Error::Internal {
                operation: format!("access file storage: {e}"),
            },
            WorkflowError::Credential(e) => Error::Internal {
                operation: format!("process credentials: {e}"),
            },
            WorkflowError::Database(e) => Error::Database(e),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Field-level problems get a structured body so clients can highlight the input
            Error::BadRequest { message, field: Some(field) } | Error::Conflict { message, field: Some(field) } => {
                let body = json!({ "message": message, "field": field });
                (status, axum::response::Json(body)).into_response()
            }
            _ => (status, self.user_message()).into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_workflow_errors_map_to_status_codes() {
        let cases = [
            (WorkflowError::validation("email", "Enter a valid email address"), StatusCode::BAD_REQUEST),
            (WorkflowError::DuplicateIdentifier { field: "email" }, StatusCode::CONFLICT),
            (WorkflowError::AlreadyWorker { account_id: Uuid::nil() }, StatusCode::CONFLICT),
            (WorkflowError::not_found("Document", Uuid::nil()), StatusCode::NOT_FOUND),
            (WorkflowError::unauthorized("admins only"), StatusCode::FORBIDDEN),
            (
                WorkflowError::Storage(StorageError::NotFound("ab/x.dat".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (WorkflowError::Database(DbError::Other(anyhow::anyhow!("boom"))), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (workflow_error, expected) in cases {
            let error = Error::from(workflow_error);
            assert_eq!(error.status_code(), expected, "{error:?}");
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = Error::from(WorkflowError::Storage(StorageError::Io(std::io::Error::other("disk on fire"))));
        assert_eq!(error.user_message(), "Internal server error");

        let error = Error::Database(DbError::Other(anyhow::anyhow!("connection reset")));
        assert_eq!(error.user_message(), "Database error occurred");
    }

    #[test]
    fn test_duplicate_identifier_names_the_field() {
        let error = Error::from(WorkflowError::DuplicateIdentifier { field: "phone_number" });
        assert_eq!(error.user_message(), "An account with this phone number already exists");
        assert!(matches!(error, Error::Conflict { field: Some("phone_number"), .. }));
    }
}
