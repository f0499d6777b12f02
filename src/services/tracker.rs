//! Work status tracker: the view model shown for a single request, and the
//! review submission that goes with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::kv::KeyValueStore;
use crate::db::models::review::Review;
use crate::db::models::service_request::{
    Actor, ActorRole, ServiceRequest, ServiceRequestStatus,
};
use crate::services::error::{ServiceRequestError, ServiceRequestResult};
use crate::services::status_policy::{self, StatusAction};
use crate::services::store::ServiceRequestStore;

/// Key the review collection is stored under.
pub const REVIEWS_KEY: &str = "findeasy_reviews";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub label: &'static str,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackerMessage {
    pub id: String,
    pub sender_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    /// Sent by the client (rendered on the right in the conversation).
    pub from_client: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackerView {
    pub request_id: String,
    pub service_title: String,
    pub status: ServiceRequestStatus,
    pub status_label: &'static str,
    pub last_updated: DateTime<Utc>,
    pub timeline: Vec<TimelineEntry>,
    pub actions: Vec<StatusAction>,
    pub messages: Vec<TrackerMessage>,
    pub can_review: bool,
}

/// Timeline derived from the current status and the stored timestamps only.
pub fn timeline(request: &ServiceRequest) -> Vec<TimelineEntry> {
    use ServiceRequestStatus::*;

    let status = request.status;
    let updated = request.updated_at;
    let mut entries = vec![TimelineEntry {
        label: "Request Created",
        at: request.created_at,
    }];

    if matches!(status, Accepted | InProgress | AwaitingConfirmation | Completed) {
        entries.push(TimelineEntry { label: "Request Accepted", at: updated });
    }
    if matches!(status, InProgress | AwaitingConfirmation | Completed) {
        entries.push(TimelineEntry { label: "Work In Progress", at: updated });
    }
    if matches!(status, AwaitingConfirmation | Completed) {
        entries.push(TimelineEntry { label: "Work Completed", at: updated });
    }
    match status {
        Completed => entries.push(TimelineEntry {
            label: "Request Confirmed & Completed",
            at: request.completed_at.unwrap_or(updated),
        }),
        Cancelled => entries.push(TimelineEntry { label: "Request Cancelled", at: updated }),
        Rejected => entries.push(TimelineEntry { label: "Request Rejected", at: updated }),
        _ => {}
    }

    entries
}

/// Whether the review form is shown.
pub fn can_review(request: &ServiceRequest, is_professional: bool) -> bool {
    !is_professional && request.status == ServiceRequestStatus::Completed && !request.reviewed
}

pub fn build_view(request: &ServiceRequest, is_professional: bool) -> TrackerView {
    let role = if is_professional {
        ActorRole::Professional
    } else {
        ActorRole::Client
    };

    TrackerView {
        request_id: request.id.clone(),
        service_title: request.service_title.clone(),
        status: request.status,
        status_label: request.status.label(),
        last_updated: request.updated_at,
        timeline: timeline(request),
        actions: status_policy::available_transitions(request.status, role).to_vec(),
        messages: request
            .messages
            .iter()
            .map(|m| TrackerMessage {
                id: m.id.clone(),
                sender_id: m.sender_id.clone(),
                message: m.message.clone(),
                timestamp: m.timestamp,
                is_read: m.is_read,
                from_client: m.sender_id == request.user_id,
            })
            .collect(),
        can_review: can_review(request, is_professional),
    }
}

/// Drives the tracker: builds views and records reviews.
pub struct StatusTracker {
    store: Arc<ServiceRequestStore>,
    persistence: Arc<dyn KeyValueStore>,
    reviews: Mutex<Vec<Review>>,
}

impl StatusTracker {
    pub async fn open(store: Arc<ServiceRequestStore>, persistence: Arc<dyn KeyValueStore>) -> Self {
        let reviews: Vec<Review> = match persistence.read(REVIEWS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("ignoring unreadable reviews: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to load reviews: {e}");
                Vec::new()
            }
        };

        Self {
            store,
            persistence,
            reviews: Mutex::new(reviews),
        }
    }

    pub fn store(&self) -> &Arc<ServiceRequestStore> {
        &self.store
    }

    pub async fn view(&self, request_id: &str, is_professional: bool) -> ServiceRequestResult<TrackerView> {
        let request = self
            .store
            .get_by_id(request_id)
            .await
            .ok_or_else(|| ServiceRequestError::NotFound(request_id.to_string()))?;
        Ok(build_view(&request, is_professional))
    }

    /// ✅ **Record a client's review and mark the request as reviewed**
    pub async fn submit_review(
        &self,
        request_id: &str,
        reviewer: &Actor,
        rating: u8,
        comment: &str,
    ) -> ServiceRequestResult<Review> {
        // Held for the whole submission so two concurrent reviews cannot both pass the check.
        let mut reviews = self.reviews.lock().await;

        let request = self.store.get_for_party(request_id, reviewer).await?;

        if !can_review(&request, reviewer.is_professional()) {
            return Err(ServiceRequestError::NotReviewable(
                "This request cannot be reviewed".to_string(),
            ));
        }
        if !(1..=5).contains(&rating) {
            return Err(ServiceRequestError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if comment.trim().is_empty() {
            return Err(ServiceRequestError::Validation(
                "Please provide a review before submitting".to_string(),
            ));
        }

        let review = Review {
            id: format!("review-{}", Uuid::new_v4()),
            request_id: request.id.clone(),
            reviewer_id: reviewer.id.clone(),
            professional_id: request.professional_id.clone(),
            rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        };

        self.store.mark_reviewed(&request.id, &review.id).await?;

        reviews.push(review.clone());
        match serde_json::to_string(&*reviews) {
            Ok(raw) => {
                if let Err(e) = self.persistence.write(REVIEWS_KEY, &raw).await {
                    error!("failed to persist reviews: {e}");
                }
            }
            Err(e) => error!("failed to serialize reviews: {e}"),
        }

        info!(request_id = %request.id, review_id = %review.id, rating, "review submitted");
        Ok(review)
    }

    pub async fn reviews_for_professional(&self, professional_id: &str) -> Vec<Review> {
        self.reviews
            .lock()
            .await
            .iter()
            .filter(|r| r.professional_id == professional_id)
            .cloned()
            .collect()
    }
}
