use thiserror::Error;

use crate::models::{appointment::MarkAs, service::ServiceStatus};

#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: service is {from}, cannot move to {to}")]
    InvalidTransition {
        from: ServiceStatus,
        to: ServiceStatus,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Appointment was already {0}")]
    AlreadyDecided(MarkAs),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl RepairError {
    /// Errors the caller can act on; everything else is an infrastructure fault.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RepairError::StoreUnavailable(_) | RepairError::Internal(_))
    }
}

pub type RepairResult<T> = Result<T, RepairError>;
