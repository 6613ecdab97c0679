//! API request and response data models.
//!
//! These structures define the public HTTP contract and are kept separate from the database
//! records in [`crate::db::models`], so storage can change without breaking clients. All
//! models are annotated with `utoipa` for the generated OpenAPI document.
//!
//! - [`accounts`]: accounts, roles, capabilities and the authenticated caller
//! - [`auth`]: registration, login and token payloads
//! - [`profiles`]: the location profile every account has
//! - [`workers`]: worker promotion, worker profiles and their enums
//! - [`documents`]: document uploads, listings and review decisions
//! - [`pagination`]: shared `skip`/`limit` query parameters

pub mod accounts;
pub mod auth;
pub mod documents;
pub mod pagination;
pub mod profiles;
pub mod workers;
