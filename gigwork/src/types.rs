//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`AccountId`]: Account identifier (also the key of the account's profile)
//! - [`WorkerProfileId`]: Worker profile identifier
//! - [`DocumentId`]: Verification document identifier
//!
//! [`abbrev_uuid`] shortens UUIDs to their first 8 chars for logging.

use uuid::Uuid;

// Type aliases for IDs
pub type AccountId = Uuid;
pub type WorkerProfileId = Uuid;
pub type DocumentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
