use super::AccountStore;
use crate::api::models::accounts::AccountRole;
use crate::db::errors::DbError;
use crate::db::handlers::{
    accounts::AccountFilter, documents::DocumentFilter, worker_profiles::WorkerProfileFilter, Accounts, Documents, Profiles,
    Repository, WorkerProfiles,
};
use crate::db::models::{
    accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
    documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentReviewDBRequest},
    profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest},
    worker_profiles::{VerificationChange, WorkerProfileCreateDBRequest, WorkerProfileDBResponse, WorkerProfileUpdateDBRequest},
};
use crate::types::{abbrev_uuid, AccountId, DocumentId, WorkerProfileId};
use crate::verification::errors::{Result, WorkflowError};
use crate::verification::status::VerificationStatus;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

/// [`AccountStore`] backed by PostgreSQL
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn not_found_as(resource: &'static str, id: impl ToString) -> impl FnOnce(DbError) -> WorkflowError {
    move |err| match err {
        DbError::NotFound => WorkflowError::not_found(resource, id),
        other => other.into(),
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create_account(&self, request: AccountCreateDBRequest) -> Result<(AccountDBResponse, ProfileDBResponse)> {
        let mut tx = self.pool.begin().await?;

        let account = Accounts::new(&mut tx)
            .create(&request)
            .await
            .map_err(WorkflowError::from_account_conflict)?;
        let profile = Profiles::new(&mut tx)
            .create(&ProfileCreateDBRequest { account_id: account.id })
            .await?;

        tx.commit().await?;
        Ok((account, profile))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Ok(Accounts::new(&mut conn).username_exists(username).await?)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<AccountDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Accounts::new(&mut conn).get_by_id(id).await?)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<AccountDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Accounts::new(&mut conn).get_by_email(email).await?)
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<AccountDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Accounts::new(&mut conn).list(filter).await?)
    }

    async fn update_account(&self, id: AccountId, request: &AccountUpdateDBRequest) -> Result<AccountDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Accounts::new(&mut conn)
            .update(id, request)
            .await
            .map_err(not_found_as("Account", id))
    }

    async fn bump_token_generation(&self, id: AccountId) -> Result<i32> {
        let mut conn = self.pool.acquire().await?;
        Accounts::new(&mut conn)
            .bump_token_generation(id)
            .await
            .map_err(not_found_as("Account", id))
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn delete_account(&self, id: AccountId) -> Result<Option<Vec<String>>> {
        let mut tx = self.pool.begin().await?;

        if Accounts::new(&mut tx).lock_for_update(id).await?.is_none() {
            return Ok(None);
        }
        // A concurrent attach_document either commits first and its file is collected below, or
        // finds the profile gone and removes its own file
        if let Some(worker_profile) = WorkerProfiles::new(&mut tx).get_by_account(id).await? {
            WorkerProfiles::new(&mut tx).lock_for_update(worker_profile.id).await?;
        }

        let file_references = Documents::new(&mut tx).file_references_for_account(id).await?;
        // Profile, worker profile and documents go with the account via ON DELETE CASCADE
        if !Accounts::new(&mut tx).delete(id).await? {
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(file_references))
    }

    async fn get_profile(&self, account_id: AccountId) -> Result<Option<ProfileDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Profiles::new(&mut conn).get_by_id(account_id).await?)
    }

    async fn update_profile(&self, account_id: AccountId, request: &ProfileUpdateDBRequest) -> Result<ProfileDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Profiles::new(&mut conn)
            .update(account_id, request)
            .await
            .map_err(not_found_as("Profile", account_id))
    }

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&request.account_id)), err)]
    async fn promote_to_worker(
        &self,
        request: WorkerProfileCreateDBRequest,
    ) -> Result<(AccountDBResponse, WorkerProfileDBResponse)> {
        let account_id = request.account_id;
        let mut tx = self.pool.begin().await?;

        let account = Accounts::new(&mut tx)
            .lock_for_update(account_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Account", account_id))?;
        if account.role == AccountRole::Worker || WorkerProfiles::new(&mut tx).get_by_account(account_id).await?.is_some() {
            return Err(WorkflowError::AlreadyWorker { account_id });
        }

        let worker_profile = WorkerProfiles::new(&mut tx).create(&request).await.map_err(|err| match err {
            DbError::UniqueViolation(_) => WorkflowError::AlreadyWorker { account_id },
            other => other.into(),
        })?;
        let account = Accounts::new(&mut tx).set_role(account_id, AccountRole::Worker).await?;

        tx.commit().await?;
        Ok((account, worker_profile))
    }

    async fn get_worker_profile(&self, id: WorkerProfileId) -> Result<Option<WorkerProfileDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(WorkerProfiles::new(&mut conn).get_by_id(id).await?)
    }

    async fn get_worker_profile_by_account(&self, account_id: AccountId) -> Result<Option<WorkerProfileDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(WorkerProfiles::new(&mut conn).get_by_account(account_id).await?)
    }

    async fn update_worker_profile(
        &self,
        id: WorkerProfileId,
        request: &WorkerProfileUpdateDBRequest,
    ) -> Result<WorkerProfileDBResponse> {
        let mut conn = self.pool.acquire().await?;
        WorkerProfiles::new(&mut conn)
            .update(id, request)
            .await
            .map_err(not_found_as("Worker profile", id))
    }

    async fn list_worker_profiles(&self, filter: &WorkerProfileFilter) -> Result<Vec<WorkerProfileDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(WorkerProfiles::new(&mut conn).list(filter).await?)
    }

    #[instrument(skip(self, request), fields(worker_profile_id = %abbrev_uuid(&request.worker_profile_id)), err)]
    async fn attach_document(&self, request: DocumentCreateDBRequest) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)> {
        let mut tx = self.pool.begin().await?;

        let worker_profile = WorkerProfiles::new(&mut tx)
            .lock_for_update(request.worker_profile_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Worker profile", request.worker_profile_id))?;

        let document = Documents::new(&mut tx).create(&request).await?;

        let next = worker_profile.verification_status.after_submission();
        let worker_profile = if next != worker_profile.verification_status {
            let change = VerificationChange::to(&worker_profile, next, None, None);
            WorkerProfiles::new(&mut tx).set_verification(worker_profile.id, &change).await?
        } else {
            worker_profile
        };

        tx.commit().await?;
        Ok((document, worker_profile))
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Documents::new(&mut conn).get_by_id(id).await?)
    }

    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Documents::new(&mut conn).list(filter).await?)
    }

    #[instrument(skip(self, review), fields(document_id = %abbrev_uuid(&document_id), outcome = %review.status), err)]
    async fn record_decision(
        &self,
        document_id: DocumentId,
        review: DocumentReviewDBRequest,
    ) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)> {
        let mut tx = self.pool.begin().await?;

        let worker_profile_id = Documents::new(&mut tx)
            .get_by_id(document_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Document", document_id))?
            .worker_profile_id;

        // Serializes concurrent decisions (and submissions) for the same worker
        let worker_profile = WorkerProfiles::new(&mut tx)
            .lock_for_update(worker_profile_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Worker profile", worker_profile_id))?;

        let mut documents = Documents::new(&mut tx);
        let document = documents
            .update(document_id, &review)
            .await
            .map_err(not_found_as("Document", document_id))?;
        let statuses = documents.statuses_for_worker(worker_profile_id).await?;

        let current = worker_profile.verification_status;
        let next = current.after_decision(statuses);
        let worker_profile = if next != current || (next == VerificationStatus::Rejected && review.reviewer_note.is_some()) {
            let change = VerificationChange::to(&worker_profile, next, Some(review.reviewed_by), review.reviewer_note.as_deref());
            WorkerProfiles::new(&mut tx).set_verification(worker_profile_id, &change).await?
        } else {
            worker_profile
        };

        tx.commit().await?;
        Ok((document, worker_profile))
    }
}
