use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::debug;

/// Error types for the model layer.
///
/// Validation failures are raised before a statement reaches the database;
/// constraint failures reported by the database are classified back into the
/// same taxonomy where possible.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A value that must be unique already exists (e.g. a duplicate email).
    #[error("{field} '{value}' already exists")]
    UniqueConstraintViolation { field: &'static str, value: String },

    /// A required column was never assigned.
    #[error("field '{field}' is required")]
    RequiredFieldMissing { field: &'static str },

    /// A value is not one of the allowed choices.
    #[error("'{value}' is not a valid choice for '{field}'")]
    InvalidChoice { field: &'static str, value: String },

    /// An integer lies outside its allowed bounds.
    #[error("{field} must be between {min} and {max}, got {value}")]
    RangeValidation {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A string is shorter or longer than its column allows.
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    /// Input struct validation failed.
    #[error("Invalid input: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    /// A related record was expected to exist but is gone.
    #[error("{entity} {id} is not loaded or no longer exists")]
    DanglingReference { entity: &'static str, id: i32 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Password hashing failed.
    #[error("Password error: {0}")]
    Password(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ModelError {
    /// Classifies a database error raised while writing one of `candidates`
    /// (`(column, value)` pairs). Unique violations naming a candidate column
    /// become [`ModelError::UniqueConstraintViolation`]; everything else is
    /// wrapped as-is.
    pub fn from_write(err: DbErr, candidates: &[(&'static str, &str)]) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
            debug!("Unique constraint violated: {}", message);
            if let Some(&(field, value)) = candidates
                .iter()
                .find(|(field, _)| message.contains(*field))
            {
                return ModelError::UniqueConstraintViolation {
                    field,
                    value: value.to_string(),
                };
            }
        }
        ModelError::Database(err)
    }

    /// Converts into a [`DbErr`] so it can be returned from
    /// `ActiveModelBehavior` hooks.
    pub fn into_db_err(self) -> DbErr {
        match self {
            ModelError::Database(err) => err,
            other => DbErr::Custom(other.to_string()),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, ModelError::UniqueConstraintViolation { .. })
    }
}

/// Type alias for Result with ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
