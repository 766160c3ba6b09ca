pub mod cache;
pub mod config;
pub mod errors;
pub mod kernel;
pub mod pagination;
pub mod reconcile;
pub mod traits;
pub mod types;
