use core_types::{CoreError, EntityKind};
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Which constraint the storage engine refused to violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityKind {
    Duplicate,
    MissingReference,
    MissingValue,
    Check,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("{entity} with id {id} was not found.")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("Integrity constraint violated: {message}")]
    Integrity { kind: IntegrityKind, message: String },

    #[error("Database query failed: {0}")]
    QueryError(#[source] sqlx::Error),
}

impl DbError {
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        DbError::NotFound { entity, id }
    }

    /// A short explanation suitable for showing next to the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DbError::Integrity { kind, .. } => Some(match kind {
                IntegrityKind::Duplicate => {
                    "A record with the same tax id, e-mail or crop name already exists."
                }
                IntegrityKind::MissingReference => {
                    "The referenced parent record does not exist."
                }
                IntegrityKind::MissingValue => "A required field was left empty.",
                IntegrityKind::Check => "A value is outside the range the schema allows.",
            }),
            DbError::ConnectionError(_) | DbError::ConnectionConfigError(_) => {
                Some("Check that the database is running and the connection settings are correct.")
            }
            DbError::NotFound { .. } => Some("List the records first to see which ids exist."),
            DbError::Validation(_) => Some("Correct the input and try again."),
            _ => None,
        }
    }
}

/// Sorts driver errors into the connection / integrity / query buckets.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let integrity = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => Some(IntegrityKind::Duplicate),
                ErrorKind::ForeignKeyViolation => Some(IntegrityKind::MissingReference),
                ErrorKind::NotNullViolation => Some(IntegrityKind::MissingValue),
                ErrorKind::CheckViolation => Some(IntegrityKind::Check),
                _ => None,
            },
            _ => None,
        };
        if let (Some(kind), sqlx::Error::Database(db_err)) = (integrity, &err) {
            return DbError::Integrity {
                kind,
                message: db_err.message().to_string(),
            };
        }

        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DbError::ConnectionError(err),
            sqlx::Error::Configuration(e) => DbError::ConnectionConfigError(e.to_string()),
            other => DbError::QueryError(other),
        }
    }
}
