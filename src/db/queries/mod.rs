pub mod notification;
pub mod service_requests;
