//! HTTP request handlers for all API endpoints.
//!
//! Handlers are thin: they extract the caller and the request, call into
//! [`crate::verification::VerificationWorkflow`] or [`crate::auth::AuthService`], and shape the
//! result into a response model. Every rule about who may do what lives in the workflow.
//!
//! # Handler Modules
//!
//! - [`auth`]: registration, login, token refresh and revocation
//! - [`accounts`]: the caller's own account, including self-deletion
//! - [`profiles`]: the caller's location profile
//! - [`workers`]: becoming a worker and editing the worker profile
//! - [`documents`]: document upload and listing for the caller
//! - [`admin`]: account administration and document decisions
//!
//! # Authentication
//!
//! Handlers taking a [`CurrentAccount`](crate::api::models::accounts::CurrentAccount) argument
//! require a valid `Authorization: Bearer` access token.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to an HTTP status and a JSON body
//! of the form `{"message": ..., "field": ...}`.

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod documents;
pub mod profiles;
pub mod workers;
