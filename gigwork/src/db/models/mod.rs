//! Database request and response types for each repository.

pub mod accounts;
pub mod documents;
pub mod file_storage;
pub mod profiles;
pub mod worker_profiles;
