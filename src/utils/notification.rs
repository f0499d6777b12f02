use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::notification::{Notification, NotificationFilter};
use crate::db::models::service_request::ServiceRequest;

/// Result type for notification operations
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in notification operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Invalid target provided: {0}")]
    InvalidTarget(String),
}

/// Destination for user-facing notifications. Delivery is fire-and-forget.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification);
}

/// Notification builder for creating system notifications
pub struct NotificationBuilder {
    title: String,
    body: Option<String>,
    notification_type: String,
    targets: Vec<String>,
    action_type: Option<String>,
    action_data: Option<Value>,
}

impl NotificationBuilder {
    /// Create a new notification builder with required fields
    pub fn new(title: impl Into<String>, notification_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: None,
            notification_type: notification_type.into(),
            targets: Vec::new(),
            action_type: None,
            action_data: None,
        }
    }

    /// Set notification body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a target user to the notification
    pub fn target_user(mut self, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        if !self.targets.contains(&user_id) {
            self.targets.push(user_id);
        }
        self
    }

    /// Set the action type and data for when notification is clicked
    pub fn action(mut self, action_type: impl Into<String>, action_data: Value) -> Self {
        self.action_type = Some(action_type.into());
        self.action_data = Some(action_data);
        self
    }

    pub fn build(self) -> NotificationResult<Notification> {
        if self.targets.is_empty() {
            return Err(NotificationError::InvalidTarget(
                "At least one target is required".to_string(),
            ));
        }

        Ok(Notification {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            body: self.body,
            type_field: self.notification_type,
            action_type: self.action_type,
            action_data: self.action_data,
            targets: self.targets,
            created_at: Utc::now(),
        })
    }

    /// Build and send the notification
    pub async fn send(self, sink: &dyn NotificationSink) -> NotificationResult<String> {
        let notification = self.build()?;
        let id = notification.id.clone();
        sink.deliver(notification).await;
        Ok(id)
    }
}

/// Common notification types for system usage
pub mod notification_types {
    pub const REQUEST_CREATED: &str = "service_request_created";
    pub const STATUS_CHANGE: &str = "service_request_status";
    pub const REVIEW_SUBMITTED: &str = "service_request_review";
}

fn request_builder(title: &str, notification_type: &str, request: &ServiceRequest) -> NotificationBuilder {
    NotificationBuilder::new(title, notification_type)
        .target_user(request.user_id.as_str())
        .target_user(request.professional_id.as_str())
        .action("view_service_request", json!({ "request_id": request.id }))
}

/// Helper functions for common notification scenarios
pub async fn notify_request_created(
    sink: &dyn NotificationSink,
    request: &ServiceRequest,
) -> NotificationResult<String> {
    request_builder("Service Request Sent", notification_types::REQUEST_CREATED, request)
        .body("Your request has been sent to the professional.")
        .send(sink)
        .await
}

pub async fn notify_status_change(
    sink: &dyn NotificationSink,
    request: &ServiceRequest,
) -> NotificationResult<String> {
    request_builder("Status Updated", notification_types::STATUS_CHANGE, request)
        .body(request.status.notification_message())
        .send(sink)
        .await
}

pub async fn notify_review_submitted(
    sink: &dyn NotificationSink,
    request: &ServiceRequest,
) -> NotificationResult<String> {
    NotificationBuilder::new("Review Submitted", notification_types::REVIEW_SUBMITTED)
        .body("Thank you for your feedback!")
        .target_user(request.user_id.as_str())
        .target_user(request.professional_id.as_str())
        .action("view_service_request", json!({ "request_id": request.id }))
        .send(sink)
        .await
}

/// Bounded in-process inbox. The oldest notifications drop off once `capacity` is reached.
pub struct InMemoryNotificationCenter {
    capacity: usize,
    entries: RwLock<VecDeque<Notification>>,
}

impl InMemoryNotificationCenter {
    pub const DEFAULT_CAPACITY: usize = 1000;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Notifications targeting `user_id`, newest first.
    pub async fn for_user(&self, user_id: &str, filter: &NotificationFilter) -> Vec<Notification> {
        let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|n| n.targets.iter().any(|t| t == user_id))
            .filter(|n| {
                filter
                    .type_field
                    .as_deref()
                    .map_or(true, |t| n.type_field == t)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn all(&self) -> Vec<Notification> {
        self.entries.read().await.iter().cloned().collect()
    }
}

impl Default for InMemoryNotificationCenter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationCenter {
    async fn deliver(&self, notification: Notification) {
        tracing::info!(
            title = %notification.title,
            body = notification.body.as_deref().unwrap_or_default(),
            targets = ?notification.targets,
            "notification"
        );

        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }
}
