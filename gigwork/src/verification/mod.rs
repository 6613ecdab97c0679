//! Worker verification: account lifecycle, worker promotion, document submission and
//! administrative decisions.
//!
//! - [`status`]: verification and document states and the transitions between them
//! - [`validation`]: field-level input rules
//! - [`registry`]: entity kinds and actions exposed to administrators
//! - [`workflow`]: the operations themselves, on top of an [`crate::store::AccountStore`]
//! - [`errors`]: the failures those operations report

pub mod errors;
pub mod registry;
pub mod status;
pub mod validation;
pub mod workflow;

pub use workflow::{DocumentUpload, VerificationWorkflow, WorkflowPolicy};
