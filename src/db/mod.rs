pub mod kv;
pub mod models;
pub mod pool;
pub mod queries;
