//! Error types for the LifeHub client

use crate::api::ApiError;
use thiserror::Error;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum AppError {
    /// The backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session is not (or no longer) authenticated
    #[error("Login required: open {login_url}")]
    LoginRequired { login_url: String },

    /// Local storage error (SQLite)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A transaction, marker or link id that is not in the local state
    #[error("{0} not found")]
    NotFound(String),

    /// Rejected user input
    #[error("{0}")]
    Invalid(String),
}

impl AppError {
    /// Whether this failure should send the user to the login page.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            AppError::LoginRequired { .. } | AppError::Api(ApiError::Unauthorized)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
