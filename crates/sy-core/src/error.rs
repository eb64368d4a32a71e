//! # AppError
//!
//! Centralized error handling for Seeya.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all sy-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Trip, TripLocation, Tripbit)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., end date before start date, foreign location)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The caller may not touch this resource (e.g., deleting someone else's tripbit)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The operation clashes with current state (e.g., a choice is already pending)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A location choice was made but nothing is waiting for one
    #[error("no location choice is pending")]
    NoPendingChoice,

    /// The data-access port failed (e.g., DB down, network error)
    #[error("persistence error: {0}")]
    Persistence(#[source] anyhow::Error),

    /// Anything else
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short text suitable for a toast/notification in the client.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(kind, _) => format!("That {} no longer exists.", kind.to_lowercase()),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::Unauthorized(_) => "You are not allowed to do that.".to_string(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::NoPendingChoice => "There is nothing waiting for a location choice.".to_string(),
            AppError::Persistence(_) => "Could not save your changes. Please try again.".to_string(),
            AppError::Internal(_) => "Something went wrong.".to_string(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Persistence(_))
    }
}

/// A specialized Result type for Seeya logic.
pub type Result<T> = std::result::Result<T, AppError>;
