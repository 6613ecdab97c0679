//! Transactional persistence for the verification workflow.
//!
//! [`AccountStore`] is the unit-of-work boundary: every method is atomic, and methods that touch
//! more than one record (registration, promotion, document submission, decisions, deletion)
//! either apply all of their effects or none of them.
//!
//! Two implementations exist:
//!
//! - [`postgres::PgAccountStore`]: runs the [`crate::db::handlers`] repositories inside a
//!   transaction, locking the worker profile row before any verification status change
//! - [`memory::MemoryStore`]: holds everything behind a single lock, for development and tests

use crate::db::handlers::accounts::AccountFilter;
use crate::db::handlers::documents::DocumentFilter;
use crate::db::handlers::worker_profiles::WorkerProfileFilter;
use crate::db::models::{
    accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
    documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentReviewDBRequest},
    profiles::{ProfileDBResponse, ProfileUpdateDBRequest},
    worker_profiles::{WorkerProfileCreateDBRequest, WorkerProfileDBResponse, WorkerProfileUpdateDBRequest},
};
use crate::types::{AccountId, DocumentId, WorkerProfileId};
use crate::verification::errors::Result;
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgAccountStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account together with its empty profile
    async fn create_account(&self, request: AccountCreateDBRequest) -> Result<(AccountDBResponse, ProfileDBResponse)>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    async fn get_account(&self, id: AccountId) -> Result<Option<AccountDBResponse>>;

    async fn get_account_by_email(&self, email: &str) -> Result<Option<AccountDBResponse>>;

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<AccountDBResponse>>;

    async fn update_account(&self, id: AccountId, request: &AccountUpdateDBRequest) -> Result<AccountDBResponse>;

    /// Increment the account's token generation, returning the new value
    async fn bump_token_generation(&self, id: AccountId) -> Result<i32>;

    /// Delete an account and everything hanging off it.
    ///
    /// Returns the storage keys of the deleted documents so the caller can remove the files,
    /// or `None` if there was no such account.
    async fn delete_account(&self, id: AccountId) -> Result<Option<Vec<String>>>;

    async fn get_profile(&self, account_id: AccountId) -> Result<Option<ProfileDBResponse>>;

    async fn update_profile(&self, account_id: AccountId, request: &ProfileUpdateDBRequest) -> Result<ProfileDBResponse>;

    /// Create the worker profile and flip the account's role to WORKER
    async fn promote_to_worker(
        &self,
        request: WorkerProfileCreateDBRequest,
    ) -> Result<(AccountDBResponse, WorkerProfileDBResponse)>;

    async fn get_worker_profile(&self, id: WorkerProfileId) -> Result<Option<WorkerProfileDBResponse>>;

    async fn get_worker_profile_by_account(&self, account_id: AccountId) -> Result<Option<WorkerProfileDBResponse>>;

    async fn update_worker_profile(
        &self,
        id: WorkerProfileId,
        request: &WorkerProfileUpdateDBRequest,
    ) -> Result<WorkerProfileDBResponse>;

    async fn list_worker_profiles(&self, filter: &WorkerProfileFilter) -> Result<Vec<WorkerProfileDBResponse>>;

    /// Insert a PENDING document and apply the submission transition to its worker profile
    async fn attach_document(&self, request: DocumentCreateDBRequest) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)>;

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentDBResponse>>;

    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentDBResponse>>;

    /// Record a review on a document and recompute the worker profile from all of its documents
    async fn record_decision(
        &self,
        document_id: DocumentId,
        review: DocumentReviewDBRequest,
    ) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)>;
}
