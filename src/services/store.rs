//! In-memory collection of service requests with snapshot persistence.
//!
//! Every mutating operation rewrites the whole collection under a single
//! key of the injected [`KeyValueStore`]. Writes are best-effort: a failed
//! write is logged and the operation still succeeds.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::kv::KeyValueStore;
use crate::db::models::service_request::{
    Actor, ActorRole, NewServiceRequest, ServiceRequest, ServiceRequestMessage, ServiceRequestStatus,
    ServiceRequestSummary,
};
use crate::services::error::{ServiceRequestError, ServiceRequestResult};
use crate::services::status_policy;
use crate::utils::notification::{self, NotificationSink};

/// Key the request collection is stored under.
pub const SERVICE_REQUESTS_KEY: &str = "findeasy_service_requests";

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub storage_key: String,
    /// Start from the sample request when nothing has been persisted yet.
    pub seed_sample_data: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: SERVICE_REQUESTS_KEY.to_string(),
            seed_sample_data: true,
        }
    }
}

pub struct ServiceRequestStore {
    requests: Mutex<Vec<ServiceRequest>>,
    persistence: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn NotificationSink>,
    storage_key: String,
}

impl ServiceRequestStore {
    /// Loads the persisted collection, falling back to the sample seed (if
    /// enabled) or an empty collection.
    pub async fn open(
        persistence: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn NotificationSink>,
        options: StoreOptions,
    ) -> Self {
        let stored = match persistence.read(&options.storage_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ServiceRequest>>(&raw) {
                Ok(requests) => Some(requests),
                Err(e) => {
                    warn!(key = %options.storage_key, "ignoring unreadable service requests: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %options.storage_key, "failed to load service requests: {e}");
                None
            }
        };

        let store = Self {
            requests: Mutex::new(Vec::new()),
            persistence,
            notifier,
            storage_key: options.storage_key,
        };

        match stored {
            Some(requests) => {
                info!(count = requests.len(), backend = store.persistence.backend(), "loaded service requests");
                *store.requests.lock().await = requests;
            }
            None if options.seed_sample_data => {
                let seed = sample_requests();
                info!(count = seed.len(), "seeding sample service requests");
                let mut requests = store.requests.lock().await;
                *requests = seed;
                store.persist(&requests).await;
            }
            None => debug!("starting with an empty service request collection"),
        }

        store
    }

    pub fn persistence(&self) -> &Arc<dyn KeyValueStore> {
        &self.persistence
    }

    async fn persist(&self, requests: &[ServiceRequest]) {
        let raw = match serde_json::to_string(requests) {
            Ok(raw) => raw,
            Err(e) => {
                error!("failed to serialize service requests: {e}");
                return;
            }
        };
        if let Err(e) = self.persistence.write(&self.storage_key, &raw).await {
            error!(key = %self.storage_key, "failed to persist service requests: {e}");
        }
    }

    /// ✅ **Create a new request in `pending`**
    pub async fn create(&self, input: NewServiceRequest) -> ServiceRequestResult<ServiceRequest> {
        for (field, value) in [
            ("serviceTitle", &input.service_title),
            ("description", &input.description),
            ("userId", &input.user_id),
            ("professionalId", &input.professional_id),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceRequestError::Validation(format!(
                    "Missing required field: {field}"
                )));
            }
        }

        let now = Utc::now();
        let request = ServiceRequest {
            id: format!("req-{}", Uuid::new_v4()),
            user_id: input.user_id,
            professional_id: input.professional_id,
            service_title: input.service_title,
            description: input.description,
            budget: input.budget,
            timeline: input.timeline,
            status: ServiceRequestStatus::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
            messages: Vec::new(),
            reviewed: false,
            review_id: None,
        };

        {
            let mut requests = self.requests.lock().await;
            requests.push(request.clone());
            self.persist(&requests).await;
        }
        info!(request_id = %request.id, professional_id = %request.professional_id, "service request created");

        if let Err(e) = notification::notify_request_created(self.notifier.as_ref(), &request).await {
            warn!("failed to notify request creation: {e}");
        }
        Ok(request)
    }

    pub async fn all(&self) -> Vec<ServiceRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn list_by_user(&self, user_id: &str) -> Vec<ServiceRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn list_by_professional(&self, professional_id: &str) -> Vec<ServiceRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.professional_id == professional_id)
            .cloned()
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<ServiceRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Loads a request on behalf of `actor`, who must be its client or its
    /// professional depending on their role.
    pub async fn get_for_party(&self, id: &str, actor: &Actor) -> ServiceRequestResult<ServiceRequest> {
        let request = self
            .get_by_id(id)
            .await
            .ok_or_else(|| ServiceRequestError::NotFound(id.to_string()))?;

        if !request.is_party(actor) {
            warn!(request_id = %id, actor = %actor.id, role = %actor.role, "rejected access by non-party");
            return Err(ServiceRequestError::Forbidden(format!(
                "{} {} is not a party to this service request",
                actor.role, actor.id
            )));
        }
        Ok(request)
    }

    /// ✅ **Move a request to `new_status` if the policy table allows it for `role`**
    pub async fn set_status(
        &self,
        id: &str,
        role: ActorRole,
        new_status: ServiceRequestStatus,
    ) -> ServiceRequestResult<ServiceRequest> {
        let updated = {
            let mut requests = self.requests.lock().await;
            let request = find_mut(&mut requests, id)?;

            if !status_policy::is_allowed(request.status, role, new_status) {
                return Err(ServiceRequestError::InvalidTransition {
                    from: request.status,
                    to: new_status,
                    role,
                });
            }

            let now = Utc::now();
            request.status = new_status;
            request.updated_at = now;
            if new_status == ServiceRequestStatus::Completed {
                request.completed_at = Some(now);
            }
            let updated = request.clone();
            self.persist(&requests).await;
            updated
        };
        info!(request_id = %id, status = %new_status, %role, "service request status updated");

        if let Err(e) = notification::notify_status_change(self.notifier.as_ref(), &updated).await {
            warn!("failed to notify status change: {e}");
        }
        Ok(updated)
    }

    /// Appends a message. Without a sender nothing happens and `Ok(None)` is returned.
    pub async fn add_message(
        &self,
        id: &str,
        sender_id: Option<&str>,
        text: &str,
    ) -> ServiceRequestResult<Option<ServiceRequestMessage>> {
        let Some(sender_id) = sender_id.filter(|s| !s.trim().is_empty()) else {
            warn!(request_id = %id, "dropping message without a sender");
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Err(ServiceRequestError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        let mut requests = self.requests.lock().await;
        let request = find_mut(&mut requests, id)?;

        let now = Utc::now();
        let message = ServiceRequestMessage {
            id: format!("msg-{}", Uuid::new_v4()),
            sender_id: sender_id.to_string(),
            message: text.to_string(),
            timestamp: now,
            is_read: false,
        };
        request.messages.push(message.clone());
        request.updated_at = now;
        self.persist(&requests).await;

        debug!(request_id = %id, message_id = %message.id, "message added");
        Ok(Some(message))
    }

    /// Marks every message not sent by `reader_id` as read. Returns how many changed.
    pub async fn mark_messages_read(&self, id: &str, reader_id: &str) -> ServiceRequestResult<usize> {
        let mut requests = self.requests.lock().await;
        let request = find_mut(&mut requests, id)?;

        let mut changed = 0;
        for message in request
            .messages
            .iter_mut()
            .filter(|m| m.sender_id != reader_id && !m.is_read)
        {
            message.is_read = true;
            changed += 1;
        }

        if changed > 0 {
            request.updated_at = Utc::now();
            self.persist(&requests).await;
        }
        Ok(changed)
    }

    /// Records that a review exists. Calling it again only replaces `review_id`.
    pub async fn mark_reviewed(&self, id: &str, review_id: &str) -> ServiceRequestResult<ServiceRequest> {
        let updated = {
            let mut requests = self.requests.lock().await;
            let request = find_mut(&mut requests, id)?;

            if request.status != ServiceRequestStatus::Completed {
                return Err(ServiceRequestError::NotReviewable(format!(
                    "Only completed requests can be reviewed (status is {})",
                    request.status
                )));
            }

            request.reviewed = true;
            request.review_id = Some(review_id.to_string());
            request.updated_at = Utc::now();
            let updated = request.clone();
            self.persist(&requests).await;
            updated
        };
        info!(request_id = %id, %review_id, "service request reviewed");

        if let Err(e) = notification::notify_review_submitted(self.notifier.as_ref(), &updated).await {
            warn!("failed to notify review: {e}");
        }
        Ok(updated)
    }

    /// Per-status counts over requests where `user_id` is either party.
    pub async fn summary_for(&self, user_id: &str) -> ServiceRequestSummary {
        let mut summary = ServiceRequestSummary::default();
        for request in self.requests.lock().await.iter().filter(|r| r.involves(user_id)) {
            summary.record(request.status);
        }
        summary
    }
}

fn find_mut<'a>(
    requests: &'a mut [ServiceRequest],
    id: &str,
) -> ServiceRequestResult<&'a mut ServiceRequest> {
    requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| ServiceRequestError::NotFound(id.to_string()))
}

/// The request a fresh installation starts with.
pub fn sample_requests() -> Vec<ServiceRequest> {
    let now = Utc::now();
    vec![ServiceRequest {
        id: "req-1".to_string(),
        user_id: "user-123".to_string(),
        professional_id: "prof-1".to_string(),
        service_title: "Website Development".to_string(),
        description: "I need a professional website for my small business".to_string(),
        budget: Some("$500-1000".to_string()),
        timeline: None,
        status: ServiceRequestStatus::Pending,
        created_at: now,
        updated_at: now,
        completed_at: None,
        messages: Vec::new(),
        reviewed: false,
        review_id: None,
    }]
}
