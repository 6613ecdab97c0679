use super::pagination::Pagination;
use crate::api::models::workers::WorkerProfileResponse;
use crate::db::models::documents::DocumentDBResponse;
use crate::types::{AccountId, DocumentId, WorkerProfileId};
use crate::verification::status::{DecisionOutcome, DocumentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Citizenship,
    DriverLicense,
    NinCard,
}

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct DocumentUploadForm {
    pub document_type: DocumentType,
    pub document_number: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DocumentId,
    #[schema(value_type = String, format = "uuid")]
    pub worker_profile_id: WorkerProfileId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub status: DocumentStatus,
    pub reviewer_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub reviewed_by: Option<AccountId>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<DocumentDBResponse> for DocumentResponse {
    fn from(db: DocumentDBResponse) -> Self {
        Self {
            id: db.id,
            worker_profile_id: db.worker_profile_id,
            document_type: db.document_type,
            document_number: db.document_number,
            content_type: db.content_type,
            size_bytes: db.size_bytes,
            status: db.status,
            reviewer_note: db.reviewer_note,
            reviewed_at: db.reviewed_at,
            reviewed_by: db.reviewed_by,
            uploaded_at: db.uploaded_at,
        }
    }
}

/// Query parameters for listing documents across all workers
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListDocumentsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub worker_profile_id: Option<WorkerProfileId>,
}

/// Request body for recording a decision on a document
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub outcome: DecisionOutcome,
    /// Shown to the worker; becomes the rejection reason when the profile is rejected
    pub note: Option<String>,
}

/// The reviewed document together with its worker profile after recomputation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    pub document: DocumentResponse,
    pub worker_profile: WorkerProfileResponse,
}
