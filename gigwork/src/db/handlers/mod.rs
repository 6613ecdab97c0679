//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection`, provides strongly-typed operations over one
//! table and returns records from [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Accounts`]: accounts, credentials and the token generation counter
//! - [`Profiles`]: the location profile created with every account
//! - [`WorkerProfiles`]: worker details and verification state
//! - [`Documents`]: identity documents and their review state
//! - [`file_storage`]: blob storage for uploaded document files (not a table)
//!
//! # The Repository Trait
//!
//! [`Repository`] defines the CRUD surface every table repository implements:
//!
//! - `create()`: insert a new record
//! - `get_by_id()`: fetch one record, `None` when absent
//! - `list()`: list with a filter and pagination
//! - `update()` / `delete()`

pub mod accounts;
pub mod documents;
pub mod file_storage;
pub mod profiles;
pub mod repository;
pub mod worker_profiles;

pub use accounts::Accounts;
pub use documents::Documents;
pub use profiles::Profiles;
pub use repository::Repository;
pub use worker_profiles::WorkerProfiles;
