//! Authentication.
//!
//! Accounts authenticate with e-mail and password at `/authentication/login` and receive a pair of
//! signed tokens:
//!
//! - an **access** token, sent as `Authorization: Bearer <token>` on every API request
//! - a **refresh** token, exchanged at `/authentication/refresh` for a new access token
//!
//! Every token carries the account's token generation. Bumping the generation
//! (`/authentication/logout-all`) revokes every token issued before, and deleting the account
//! revokes them too because the subject no longer resolves.
//!
//! Authorization is not handled here: the [`crate::verification::workflow`] checks capabilities
//! and the admin registry itself.

pub mod current_user;
pub mod password;
pub mod service;
pub mod session;

pub use service::{AuthService, TokenPair};
