use crate::auth::password::PasswordError;
use crate::db::errors::{DbError, StorageError};
use crate::types::AccountId;
use thiserror::Error;

/// Failures of the worker verification workflow.
///
/// Every operation either completes or fails with one of these, leaving no partial state behind.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Missing or malformed input
    #[error("{message}")]
    Validation { field: Option<&'static str>, message: String },

    /// An account already uses this identifier
    #[error("An account with this {field} already exists")]
    DuplicateIdentifier { field: &'static str },

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// The account was already promoted
    #[error("Account {account_id} already has a worker profile")]
    AlreadyWorker { account_id: AccountId },

    /// The actor may not perform this operation
    #[error("{message}")]
    Authorization { message: String },

    /// The file store rejected or lost a file
    #[error("File storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Credential(#[from] PasswordError),

    /// Non-recoverable persistence failure
    #[error(transparent)]
    Database(#[from] DbError),
}

impl WorkflowError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        WorkflowError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        WorkflowError::Authorization { message: message.into() }
    }

    /// Translate a unique violation on the accounts table into the identifier that clashed.
    pub fn from_account_conflict(err: DbError) -> Self {
        let field = match &err {
            DbError::UniqueViolation(v) if v.involves("email") => "email",
            DbError::UniqueViolation(v) if v.involves("phone") => "phone_number",
            DbError::UniqueViolation(v) if v.involves("username") => "username",
            _ => return WorkflowError::Database(err),
        };
        WorkflowError::DuplicateIdentifier { field }
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::Database(err.into())
    }
}

/// Type alias for workflow results
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::Violation;

    fn unique(constraint: &str) -> DbError {
        DbError::UniqueViolation(Violation {
            constraint: Some(constraint.to_string()),
            table: Some("accounts".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        })
    }

    #[test]
    fn test_account_conflicts_name_the_identifier() {
        assert!(matches!(
            WorkflowError::from_account_conflict(unique("accounts_email_unique")),
            WorkflowError::DuplicateIdentifier { field: "email" }
        ));
        assert!(matches!(
            WorkflowError::from_account_conflict(unique("accounts_phone_number_unique")),
            WorkflowError::DuplicateIdentifier { field: "phone_number" }
        ));
        assert!(matches!(
            WorkflowError::from_account_conflict(unique("accounts_username_unique")),
            WorkflowError::DuplicateIdentifier { field: "username" }
        ));
    }

    #[test]
    fn test_other_db_errors_pass_through() {
        assert!(matches!(
            WorkflowError::from_account_conflict(DbError::NotFound),
            WorkflowError::Database(DbError::NotFound)
        ));
    }
}
