//! Verification states and the transitions between them.
//!
//! A worker profile moves through:
//!
//! ```text
//! UNVERIFIED --(first submission)------> PENDING
//! PENDING    --(all documents approved)-> APPROVED
//! PENDING    --(any document rejected)--> REJECTED
//! REJECTED   --(new submission)---------> PENDING
//! APPROVED   (terminal)
//! ```
//!
//! The profile status after a decision is always recomputed from the full set of document
//! statuses, see [`aggregate_document_statuses`].

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Verification state of a worker profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Approved,
    Rejected,
}

/// Review state of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

/// Outcome an administrator can record on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

impl DecisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOutcome::Approved => "approved",
            DecisionOutcome::Rejected => "rejected",
        }
    }
}

impl From<DecisionOutcome> for DocumentStatus {
    fn from(outcome: DecisionOutcome) -> Self {
        match outcome {
            DecisionOutcome::Approved => DocumentStatus::Approved,
            DecisionOutcome::Rejected => DocumentStatus::Rejected,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Unverified => "UNVERIFIED",
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Approved => "APPROVED",
            VerificationStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Approved => "APPROVED",
            DocumentStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Combine document statuses into a profile status.
///
/// Any rejected document rejects the profile, all approved documents approve it, and anything
/// else (including a mix of approved and pending) leaves it pending. A worker without documents
/// has nothing to verify and is reported as unverified.
pub fn aggregate_document_statuses<I>(statuses: I) -> VerificationStatus
where
    I: IntoIterator<Item = DocumentStatus>,
{
    let mut seen_any = false;
    let mut all_approved = true;

    for status in statuses {
        seen_any = true;
        match status {
            DocumentStatus::Rejected => return VerificationStatus::Rejected,
            DocumentStatus::Pending => all_approved = false,
            DocumentStatus::Approved => {}
        }
    }

    match (seen_any, all_approved) {
        (false, _) => VerificationStatus::Unverified,
        (true, true) => VerificationStatus::Approved,
        (true, false) => VerificationStatus::Pending,
    }
}

impl VerificationStatus {
    /// Approved workers stay approved whatever happens to their documents afterwards.
    pub fn is_terminal(self) -> bool {
        matches!(self, VerificationStatus::Approved)
    }

    /// Status after a new document has been attached to the profile.
    pub fn after_submission(self) -> Self {
        match self {
            VerificationStatus::Unverified | VerificationStatus::Rejected => VerificationStatus::Pending,
            other => other,
        }
    }

    /// Status after an administrator decided on one of the profile's documents.
    pub fn after_decision<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = DocumentStatus>,
    {
        if self.is_terminal() {
            return self;
        }
        aggregate_document_statuses(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;

    #[test]
    fn test_aggregate_all_approved() {
        assert_eq!(aggregate_document_statuses([Approved, Approved]), VerificationStatus::Approved);
    }

    #[test]
    fn test_aggregate_any_rejected_wins() {
        assert_eq!(aggregate_document_statuses([Approved, Rejected, Pending]), VerificationStatus::Rejected);
        assert_eq!(aggregate_document_statuses([Pending, Rejected]), VerificationStatus::Rejected);
    }

    #[test]
    fn test_aggregate_mixed_is_pending() {
        assert_eq!(aggregate_document_statuses([Approved, Pending]), VerificationStatus::Pending);
        assert_eq!(aggregate_document_statuses([Pending]), VerificationStatus::Pending);
    }

    #[test]
    fn test_aggregate_empty_is_unverified() {
        assert_eq!(aggregate_document_statuses(Vec::new()), VerificationStatus::Unverified);
    }

    #[test]
    fn test_submission_transitions() {
        assert_eq!(VerificationStatus::Unverified.after_submission(), VerificationStatus::Pending);
        assert_eq!(VerificationStatus::Rejected.after_submission(), VerificationStatus::Pending);
        assert_eq!(VerificationStatus::Pending.after_submission(), VerificationStatus::Pending);
        assert_eq!(VerificationStatus::Approved.after_submission(), VerificationStatus::Approved);
    }

    #[test]
    fn test_decision_recomputes_unless_approved() {
        assert_eq!(
            VerificationStatus::Pending.after_decision([Approved, Approved]),
            VerificationStatus::Approved
        );
        assert_eq!(
            VerificationStatus::Pending.after_decision([Approved, Rejected]),
            VerificationStatus::Rejected
        );
        // a rejected profile can be approved once the rejected document is revised
        assert_eq!(
            VerificationStatus::Rejected.after_decision([Approved, Approved]),
            VerificationStatus::Approved
        );
        assert_eq!(
            VerificationStatus::Approved.after_decision([Approved, Rejected]),
            VerificationStatus::Approved
        );
    }

    #[test]
    fn test_outcome_maps_to_document_status() {
        assert_eq!(DocumentStatus::from(DecisionOutcome::Approved), Approved);
        assert_eq!(DocumentStatus::from(DecisionOutcome::Rejected), Rejected);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&VerificationStatus::Unverified).unwrap(), "\"UNVERIFIED\"");
        let outcome: DecisionOutcome = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(outcome, DecisionOutcome::Rejected);
    }
}
