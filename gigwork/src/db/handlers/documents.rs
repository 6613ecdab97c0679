//! Database repository for verification documents.

use crate::types::{abbrev_uuid, AccountId, DocumentId, WorkerProfileId};
use crate::{
    api::models::documents::DocumentType,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentReviewDBRequest},
    },
    verification::status::DocumentStatus,
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing documents
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub skip: i64,
    pub limit: i64,
    pub worker_profile_id: Option<WorkerProfileId>,
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
}

impl DocumentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            worker_profile_id: None,
            status: None,
            document_type: None,
        }
    }

    pub fn for_worker(mut self, worker_profile_id: WorkerProfileId) -> Self {
        self.worker_profile_id = Some(worker_profile_id);
        self
    }
}

pub struct Documents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Documents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Statuses of every document attached to a worker profile
    #[instrument(skip(self), fields(worker_profile_id = %abbrev_uuid(&worker_profile_id)), err)]
    pub async fn statuses_for_worker(&mut self, worker_profile_id: WorkerProfileId) -> Result<Vec<DocumentStatus>> {
        let statuses: Vec<DocumentStatus> = sqlx::query_scalar("SELECT status FROM documents WHERE worker_profile_id = $1")
            .bind(worker_profile_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(statuses)
    }

    /// Storage keys of every file uploaded by an account, used to clean up after deletion
    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn file_references_for_account(&mut self, account_id: AccountId) -> Result<Vec<String>> {
        let references: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT d.file_reference FROM documents d
            JOIN worker_profiles w ON w.id = d.worker_profile_id
            WHERE w.account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(references)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Documents<'c> {
    type CreateRequest = DocumentCreateDBRequest;
    type UpdateRequest = DocumentReviewDBRequest;
    type Response = DocumentDBResponse;
    type Id = DocumentId;
    type Filter = DocumentFilter;

    #[instrument(skip(self, request), fields(worker_profile_id = %abbrev_uuid(&request.worker_profile_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(
            r#"
            INSERT INTO documents (id, worker_profile_id, document_type, document_number, file_reference, content_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.worker_profile_id)
        .bind(request.document_type)
        .bind(&request.document_number)
        .bind(&request.file_reference)
        .bind(&request.content_type)
        .bind(request.size_bytes)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let document = sqlx::query_as::<_, DocumentDBResponse>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(document)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let documents = sqlx::query_as::<_, DocumentDBResponse>(
            r#"
            SELECT * FROM documents
            WHERE ($1::uuid IS NULL OR worker_profile_id = $1)
              AND ($2::document_status IS NULL OR status = $2)
              AND ($3::document_type IS NULL OR document_type = $3)
            ORDER BY uploaded_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.worker_profile_id)
        .bind(filter.status)
        .bind(filter.document_type)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(documents)
    }

    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a review. Documents are only ever updated by a review.
    #[instrument(skip(self, request), fields(document_id = %abbrev_uuid(&id), status = %request.status), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(
            r#"
            UPDATE documents SET
                status = $2,
                reviewed_by = $3,
                reviewer_note = $4,
                reviewed_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(request.reviewed_by)
        .bind(&request.reviewer_note)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{accounts::AccountRole, workers::ServiceCategory};
    use crate::db::handlers::{Accounts, WorkerProfiles};
    use crate::db::models::{accounts::AccountCreateDBRequest, worker_profiles::WorkerProfileCreateDBRequest};
    use sqlx::PgPool;

    async fn create_worker(conn: &mut PgConnection) -> (AccountId, WorkerProfileId) {
        let account = Accounts::new(&mut *conn)
            .create(&AccountCreateDBRequest {
                email: "bikash@example.com".to_string(),
                username: "bikash".to_string(),
                first_name: "Bikash".to_string(),
                last_name: "Thapa".to_string(),
                phone_number: None,
                password_hash: "x".to_string(),
                role: AccountRole::Worker,
                capabilities: vec![],
            })
            .await
            .unwrap();
        let profile = WorkerProfiles::new(&mut *conn)
            .create(&WorkerProfileCreateDBRequest {
                account_id: account.id,
                service_category: ServiceCategory::Electrician,
                skills: None,
                bio: None,
                hourly_rate: None,
                service_latitude: None,
                service_longitude: None,
                service_radius_km: None,
            })
            .await
            .unwrap();
        (account.id, profile.id)
    }

    fn upload(worker_profile_id: WorkerProfileId, key: &str) -> DocumentCreateDBRequest {
        DocumentCreateDBRequest {
            worker_profile_id,
            document_type: DocumentType::Citizenship,
            document_number: "12-34-56".to_string(),
            file_reference: key.to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 2048,
        }
    }

    #[sqlx::test]
    async fn test_document_review_lifecycle(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let (account_id, worker_profile_id) = create_worker(&mut conn).await;

        let mut repo = Documents::new(&mut conn);
        let first = repo.create(&upload(worker_profile_id, "ab/ab1.dat")).await.unwrap();
        repo.create(&upload(worker_profile_id, "cd/cd2.dat")).await.unwrap();
        assert_eq!(first.status, DocumentStatus::Pending);
        assert!(first.reviewed_at.is_none());

        let reviewed = repo
            .update(
                first.id,
                &DocumentReviewDBRequest {
                    status: DocumentStatus::Rejected,
                    reviewed_by: account_id,
                    reviewer_note: Some("blurry".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(reviewed.status, DocumentStatus::Rejected);
        assert!(reviewed.reviewed_at.is_some());

        let mut statuses = repo.statuses_for_worker(worker_profile_id).await.unwrap();
        statuses.sort_by_key(|s| s.to_string());
        assert_eq!(statuses, vec![DocumentStatus::Pending, DocumentStatus::Rejected]);

        let mut filter = DocumentFilter::new(0, 10).for_worker(worker_profile_id);
        filter.status = Some(DocumentStatus::Pending);
        assert_eq!(repo.list(&filter).await.unwrap().len(), 1);

        let mut keys = repo.file_references_for_account(account_id).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["ab/ab1.dat".to_string(), "cd/cd2.dat".to_string()]);
    }

    #[sqlx::test]
    async fn test_deleting_account_cascades_to_documents(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let (account_id, worker_profile_id) = create_worker(&mut conn).await;
        let document = Documents::new(&mut conn).create(&upload(worker_profile_id, "ef/ef.dat")).await.unwrap();

        assert!(Accounts::new(&mut conn).delete(account_id).await.unwrap());
        assert!(Documents::new(&mut conn).get_by_id(document.id).await.unwrap().is_none());
        assert!(WorkerProfiles::new(&mut conn).get_by_id(worker_profile_id).await.unwrap().is_none());
    }
}
