pub mod auth;
pub mod health;
pub mod notification;
pub mod service_requests;
