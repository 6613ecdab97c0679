use crate::api::models::documents::DocumentType;
use crate::types::{AccountId, DocumentId, WorkerProfileId};
use crate::verification::status::DocumentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for attaching an uploaded document. Documents start PENDING.
#[derive(Debug, Clone)]
pub struct DocumentCreateDBRequest {
    pub worker_profile_id: WorkerProfileId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub file_reference: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Database request recording an administrator's review of a document
#[derive(Debug, Clone)]
pub struct DocumentReviewDBRequest {
    pub status: DocumentStatus,
    pub reviewed_by: AccountId,
    pub reviewer_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentDBResponse {
    pub id: DocumentId,
    pub worker_profile_id: WorkerProfileId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub file_reference: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: DocumentStatus,
    pub reviewer_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<AccountId>,
    pub uploaded_at: DateTime<Utc>,
}
