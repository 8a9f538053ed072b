use http::StatusCode;
use sea_orm::error::DbErr;
use serde::Serialize;

/// Domain error taxonomy for the order core.
///
/// Every operation returns one of these; the variant is the stable kind a
/// transport layer maps to a status code via [`ServiceError::status_code`],
/// and the message carries enough context for the caller to correct input
/// without re-querying (e.g. the max refundable amount on `ExceedsLimit`).
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Already paid / already cancelled / already fully refunded. The client
    /// must re-fetch state before retrying.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Refund amount beyond the remaining refundable ceiling.
    #[error("Refund limit exceeded: {0}")]
    ExceedsLimit(String),

    /// A concurrent transition won the version check; the caller saw stale
    /// state and must re-fetch.
    #[error("Concurrent modification of order {0}")]
    ConcurrentModification(i64),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Whether retrying the whole operation is safe. Only transient store
    /// failures qualify; every transition is atomic, so a retry can never
    /// double-apply.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::DatabaseError(DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
        )
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::ConcurrentModification(_) => StatusCode::CONFLICT,
            Self::ExceedsLimit(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for responses. Internal errors
    /// return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            Self::ConcurrentModification(id) => {
                format!("Order {} was modified concurrently; re-fetch and retry", id)
            }
            _ => self.to_string(),
        }
    }
}
