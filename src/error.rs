//! Error types for Folio.

use thiserror::Error;

/// Common error type for Folio.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Database error.
    ///
    /// Any store failure that is not a uniqueness violation ends up here.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Operation conflicts with the current state (duplicate name, non-empty folder, cycle).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Blob storage collaborator error.
    #[error("blob storage error: {0}")]
    Blob(String),

    /// Operation has no backing implementation in this deployment.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Uniqueness violations are the store's conflict signal; everything else is opaque.
impl From<sqlx::Error> for FolioError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return FolioError::Conflict("name already exists".to_string());
            }
        }
        FolioError::Database(e.to_string())
    }
}

impl From<crate::library::NameError> for FolioError {
    fn from(e: crate::library::NameError) -> Self {
        FolioError::Validation(e.to_string())
    }
}

/// Result type alias for Folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_error_display() {
        let err = FolioError::Permission("not a project member".to_string());
        assert_eq!(err.to_string(), "permission denied: not a project member");
    }

    #[test]
    fn test_validation_error_display() {
        let err = FolioError::Validation("name is empty".to_string());
        assert_eq!(err.to_string(), "validation error: name is empty");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = FolioError::NotFound("folder".to_string());
        assert_eq!(err.to_string(), "folder not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = FolioError::Conflict("folder is not empty".to_string());
        assert_eq!(err.to_string(), "conflict: folder is not empty");
    }

    #[test]
    fn test_name_error_conversion() {
        let err: FolioError = crate::library::NameError::Empty.into();
        assert!(matches!(err, FolioError::Validation(_)));
        assert_eq!(err.to_string(), "validation error: name must not be empty");
    }

    #[test]
    fn test_sqlx_row_not_found_is_database_error() {
        let err: FolioError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, FolioError::Database(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FolioError = io_err.into();
        assert!(matches!(err, FolioError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(FolioError::Permission("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
