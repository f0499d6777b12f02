//! Role-gated transition table for service requests.
//!
//! This table is the only place that decides which status changes are legal.
//! The store consults it before every status mutation; views use it to list
//! the actions a user may take.

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::service_request::{ActorRole, ServiceRequestStatus};

/// A legal next status together with the button label shown for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusAction {
    pub status: ServiceRequestStatus,
    pub label: &'static str,
}

const fn action(status: ServiceRequestStatus, label: &'static str) -> StatusAction {
    StatusAction { status, label }
}

/// Ordered list of statuses `role` may move a request to from `current`.
///
/// Any combination missing from the table (terminal status or the wrong
/// side of the engagement) yields an empty slice.
pub fn available_transitions(
    current: ServiceRequestStatus,
    role: ActorRole,
) -> &'static [StatusAction] {
    use ServiceRequestStatus::*;

    const PRO_PENDING: &[StatusAction] = &[
        action(Accepted, "Accept Request"),
        action(Rejected, "Reject Request"),
    ];
    const PRO_ACCEPTED: &[StatusAction] = &[
        action(InProgress, "Start Work"),
        action(Cancelled, "Cancel Request"),
    ];
    const PRO_IN_PROGRESS: &[StatusAction] = &[action(AwaitingConfirmation, "Mark as Complete")];
    const CLIENT_PENDING: &[StatusAction] = &[action(Cancelled, "Cancel Request")];
    const CLIENT_AWAITING: &[StatusAction] = &[action(Completed, "Confirm Completion")];

    match (role, current) {
        (ActorRole::Professional, Pending) => PRO_PENDING,
        (ActorRole::Professional, Accepted) => PRO_ACCEPTED,
        (ActorRole::Professional, InProgress) => PRO_IN_PROGRESS,
        (ActorRole::Client, Pending) => CLIENT_PENDING,
        (ActorRole::Client, AwaitingConfirmation) => CLIENT_AWAITING,
        _ => &[],
    }
}

/// Whether `role` may move a request from `current` to `next`.
pub fn is_allowed(current: ServiceRequestStatus, role: ActorRole, next: ServiceRequestStatus) -> bool {
    available_transitions(current, role)
        .iter()
        .any(|a| a.status == next)
}
