//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): registration, login, token refresh and revocation
//! - **Self service** (`/api/v1/*`): the caller's account, profile, worker profile and documents
//! - **Administration** (`/admin/api/v1/*`): account, worker and document review, gated by the
//!   ADMIN capability and the admin registry
//!
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
