use crate::db::models::service_request::{ActorRole, ServiceRequestStatus};

pub type ServiceRequestResult<T> = Result<T, ServiceRequestError>;

/// Errors surfaced to callers of the service-request operations.
///
/// Persistence and notification failures are never reported here: writes are
/// best-effort and only logged.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceRequestError {
    #[error("{0}")]
    Validation(String),

    #[error("Service request not found: {0}")]
    NotFound(String),

    #[error("A {role} cannot move a request from {from} to {to}")]
    InvalidTransition {
        from: ServiceRequestStatus,
        to: ServiceRequestStatus,
        role: ActorRole,
    },

    #[error("{0}")]
    NotReviewable(String),

    #[error("{0}")]
    Forbidden(String),
}
