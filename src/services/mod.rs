pub mod error;
pub mod status_policy;
pub mod store;
pub mod tracker;
