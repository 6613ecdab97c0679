use thiserror::Error;

/// The constraint a write ran into, as reported by postgres
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub constraint: Option<String>,
    pub table: Option<String>,
    pub message: String,
}

impl Violation {
    fn from_database(err: &dyn sqlx::error::DatabaseError) -> Self {
        Self {
            constraint: err.constraint().map(str::to_string),
            table: err.table().map(str::to_string),
            message: err.message().to_string(),
        }
    }

    /// Whether the violated constraint's name mentions `column`
    pub fn involves(&self, column: &str) -> bool {
        self.constraint.as_deref().is_some_and(|c| c.contains(column))
    }
}

/// Database failures that callers can act on. Everything else is `Other`.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violation")]
    UniqueViolation(Violation),

    #[error("Foreign key constraint violation")]
    ForeignKeyViolation(Violation),

    #[error("Check constraint violation")]
    CheckViolation(Violation),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::UniqueViolation(Violation::from_database(db_err.as_ref()))
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DbError::ForeignKeyViolation(Violation::from_database(db_err.as_ref()))
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                DbError::CheckViolation(Violation::from_database(db_err.as_ref()))
            }
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Errors raised by file storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No file stored under key {0}")]
    NotFound(String),

    /// The key escapes the storage root or is otherwise malformed
    #[error("Invalid storage key {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_matches_constraint_names() {
        let violation = Violation {
            constraint: Some("accounts_phone_number_unique".to_string()),
            table: Some("accounts".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert!(violation.involves("phone"));
        assert!(!violation.involves("email"));

        let anonymous = Violation { constraint: None, ..violation };
        assert!(!anonymous.involves("phone"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Other(_)));
    }
}
