use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// ✅ **Review left by a client on a completed service request**
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub request_id: String,
    pub reviewer_id: String,
    pub professional_id: String,
    pub rating: u8,   // 1..=5
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// ✅ **New Review Request (Frontend Sends This)**
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}
