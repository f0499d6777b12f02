pub mod notification;
pub mod review;
pub mod service_request;
