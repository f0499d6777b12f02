// src/db/models/service_request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Lifecycle status of a service request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRequestStatus {
    Pending,
    Accepted,
    InProgress,
    AwaitingConfirmation,
    Completed,
    Cancelled,
    Rejected,
}

impl ServiceRequestStatus {
    pub const ALL: [ServiceRequestStatus; 7] = [
        ServiceRequestStatus::Pending,
        ServiceRequestStatus::Accepted,
        ServiceRequestStatus::InProgress,
        ServiceRequestStatus::AwaitingConfirmation,
        ServiceRequestStatus::Completed,
        ServiceRequestStatus::Cancelled,
        ServiceRequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRequestStatus::Pending => "pending",
            ServiceRequestStatus::Accepted => "accepted",
            ServiceRequestStatus::InProgress => "in_progress",
            ServiceRequestStatus::AwaitingConfirmation => "awaiting_confirmation",
            ServiceRequestStatus::Completed => "completed",
            ServiceRequestStatus::Cancelled => "cancelled",
            ServiceRequestStatus::Rejected => "rejected",
        }
    }

    /// Badge text shown next to the request.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceRequestStatus::Pending => "Pending",
            ServiceRequestStatus::Accepted => "Accepted",
            ServiceRequestStatus::InProgress => "In Progress",
            ServiceRequestStatus::AwaitingConfirmation => "Awaiting Confirmation",
            ServiceRequestStatus::Completed => "Completed",
            ServiceRequestStatus::Cancelled => "Cancelled",
            ServiceRequestStatus::Rejected => "Rejected",
        }
    }

    /// Message shown to the user after a request moves into this status.
    pub fn notification_message(&self) -> &'static str {
        match self {
            ServiceRequestStatus::Pending => "Service request is now pending.",
            ServiceRequestStatus::Accepted => "Service request has been accepted.",
            ServiceRequestStatus::InProgress => "Service is now in progress.",
            ServiceRequestStatus::AwaitingConfirmation => {
                "Service is awaiting confirmation of completion."
            }
            ServiceRequestStatus::Completed => "Service has been marked as completed.",
            ServiceRequestStatus::Cancelled => "Service request has been cancelled.",
            ServiceRequestStatus::Rejected => "Service request has been rejected.",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceRequestStatus::Completed
                | ServiceRequestStatus::Cancelled
                | ServiceRequestStatus::Rejected
        )
    }
}

impl fmt::Display for ServiceRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the engagement the current actor is on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Client,
    Professional,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Client => f.write_str("client"),
            ActorRole::Professional => f.write_str("professional"),
        }
    }
}

/// The authenticated user acting on a request, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_professional(&self) -> bool {
        self.role == ActorRole::Professional
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for ActorRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" | "user" | "recruiter" => Ok(ActorRole::Client),
            "professional" => Ok(ActorRole::Professional),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One message exchanged on a service request. Never edited or removed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestMessage {
    pub id: String,
    pub sender_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// ✅ **A negotiated engagement between a client and a professional**
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub user_id: String,
    pub professional_id: String,
    pub service_title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub status: ServiceRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<ServiceRequestMessage>,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
}

impl ServiceRequest {
    /// Whether `user_id` is the client or the professional on this request.
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.professional_id == user_id
    }

    /// Whether `actor` is this request's client (for the client role) or its
    /// professional (for the professional role).
    pub fn is_party(&self, actor: &Actor) -> bool {
        match actor.role {
            ActorRole::Client => self.user_id == actor.id,
            ActorRole::Professional => self.professional_id == actor.id,
        }
    }
}

/// ✅ **New Service Request (the client submits this)**
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRequest {
    pub user_id: String,
    pub professional_id: String,
    pub service_title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
}

/// Request body for `POST /service-requests`. The client id comes from the token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub professional_id: String,
    pub service_title: String,
    pub description: String,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateServiceRequestStatus {
    pub status: ServiceRequestStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewServiceRequestMessage {
    pub message: String,
}

/// Per-status counts for a user's dashboard.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestSummary {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub in_progress: usize,
    pub awaiting_confirmation: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub rejected: usize,
}

impl ServiceRequestSummary {
    pub fn record(&mut self, status: ServiceRequestStatus) {
        self.total += 1;
        let slot = match status {
            ServiceRequestStatus::Pending => &mut self.pending,
            ServiceRequestStatus::Accepted => &mut self.accepted,
            ServiceRequestStatus::InProgress => &mut self.in_progress,
            ServiceRequestStatus::AwaitingConfirmation => &mut self.awaiting_confirmation,
            ServiceRequestStatus::Completed => &mut self.completed,
            ServiceRequestStatus::Cancelled => &mut self.cancelled,
            ServiceRequestStatus::Rejected => &mut self.rejected,
        };
        *slot += 1;
    }
}
