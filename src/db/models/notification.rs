// src/db/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    #[serde(rename = "type")]
    pub type_field: String, // Use type_field instead of r#type
    pub action_type: Option<String>,
    pub action_data: Option<Value>,
    pub targets: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Default, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct NotificationFilter {
    #[serde(rename = "type")]
    pub type_field: Option<String>,
    pub limit: Option<u32>,
}
