use super::AccountStore;
use crate::api::models::accounts::AccountRole;
use crate::api::models::workers::AvailabilityStatus;
use crate::db::handlers::{accounts::AccountFilter, documents::DocumentFilter, worker_profiles::WorkerProfileFilter};
use crate::db::models::{
    accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
    documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentReviewDBRequest},
    profiles::{default_preferred_radius, ProfileDBResponse, ProfileUpdateDBRequest},
    worker_profiles::{
        default_service_radius, VerificationChange, WorkerProfileCreateDBRequest, WorkerProfileDBResponse,
        WorkerProfileUpdateDBRequest,
    },
};
use crate::types::{AccountId, DocumentId, WorkerProfileId};
use crate::verification::errors::{Result, WorkflowError};
use crate::verification::status::{DocumentStatus, VerificationStatus};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, AccountDBResponse>,
    profiles: HashMap<AccountId, ProfileDBResponse>,
    worker_profiles: HashMap<WorkerProfileId, WorkerProfileDBResponse>,
    documents: HashMap<DocumentId, DocumentDBResponse>,
    /// Insertion sequence per record id, newest-first listings sort on it
    sequence: HashMap<Uuid, u64>,
    next_sequence: u64,
}

impl State {
    fn record_insert(&mut self, id: Uuid) {
        self.next_sequence += 1;
        self.sequence.insert(id, self.next_sequence);
    }

    fn newest_first<T: Clone>(&self, items: Vec<&T>, id: impl Fn(&T) -> Uuid, skip: i64, limit: i64) -> Vec<T> {
        let mut items = items;
        items.sort_by_key(|item| std::cmp::Reverse(self.sequence.get(&id(item)).copied().unwrap_or_default()));
        items
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect()
    }

    fn worker_for_account(&self, account_id: AccountId) -> Option<&WorkerProfileDBResponse> {
        self.worker_profiles.values().find(|w| w.account_id == account_id)
    }

    fn apply_verification(&mut self, id: WorkerProfileId, change: VerificationChange) -> Result<WorkerProfileDBResponse> {
        let worker_profile = self
            .worker_profiles
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("Worker profile", id))?;
        worker_profile.verification_status = change.status;
        worker_profile.verified_at = change.verified_at;
        worker_profile.verified_by = change.verified_by;
        worker_profile.rejection_reason = change.rejection_reason;
        worker_profile.updated_at = Utc::now();
        Ok(worker_profile.clone())
    }
}

/// [`AccountStore`] kept entirely in memory.
///
/// A single write lock around all tables stands in for database transactions, so every
/// operation is atomic and decisions on the same worker serialize. Unique constraints,
/// cascades and column defaults follow the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.state.read().accounts.len()
    }

    pub fn profile_count(&self) -> usize {
        self.state.read().profiles.len()
    }

    pub fn worker_profile_count(&self) -> usize {
        self.state.read().worker_profiles.len()
    }

    pub fn document_count(&self) -> usize {
        self.state.read().documents.len()
    }
}

fn matches_search(account: &AccountDBResponse, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    account.email.to_lowercase().contains(&needle)
        || account.username.to_lowercase().contains(&needle)
        || account.phone_number.as_deref().is_some_and(|p| p.contains(&needle))
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, request: AccountCreateDBRequest) -> Result<(AccountDBResponse, ProfileDBResponse)> {
        let mut state = self.state.write();

        for existing in state.accounts.values() {
            if existing.email == request.email {
                return Err(WorkflowError::DuplicateIdentifier { field: "email" });
            }
            if request.phone_number.is_some() && existing.phone_number == request.phone_number {
                return Err(WorkflowError::DuplicateIdentifier { field: "phone_number" });
            }
            if existing.username == request.username {
                return Err(WorkflowError::DuplicateIdentifier { field: "username" });
            }
        }

        let now = Utc::now();
        let account = AccountDBResponse {
            id: Uuid::new_v4(),
            email: request.email,
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            password_hash: request.password_hash,
            role: request.role,
            capabilities: request.capabilities,
            token_generation: 0,
            created_at: now,
            updated_at: now,
        };
        let profile = ProfileDBResponse {
            account_id: account.id,
            current_latitude: None,
            current_longitude: None,
            current_address: None,
            preferred_radius_km: default_preferred_radius(),
            created_at: now,
            updated_at: now,
        };

        state.record_insert(account.id);
        state.accounts.insert(account.id, account.clone());
        state.profiles.insert(account.id, profile.clone());
        Ok((account, profile))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.state.read().accounts.values().any(|a| a.username == username))
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<AccountDBResponse>> {
        Ok(self.state.read().accounts.get(&id).cloned())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<AccountDBResponse>> {
        Ok(self.state.read().accounts.values().find(|a| a.email == email).cloned())
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<AccountDBResponse>> {
        let state = self.state.read();
        let matching = state
            .accounts
            .values()
            .filter(|a| filter.role.is_none_or(|role| a.role == role))
            .filter(|a| filter.search.as_deref().is_none_or(|s| matches_search(a, s)))
            .collect();
        Ok(state.newest_first(matching, |a| a.id, filter.skip, filter.limit))
    }

    async fn update_account(&self, id: AccountId, request: &AccountUpdateDBRequest) -> Result<AccountDBResponse> {
        let mut state = self.state.write();
        let account = state.accounts.get_mut(&id).ok_or_else(|| WorkflowError::not_found("Account", id))?;

        if let Some(first_name) = &request.first_name {
            account.first_name = first_name.clone();
        }
        if let Some(last_name) = &request.last_name {
            account.last_name = last_name.clone();
        }
        if let Some(password_hash) = &request.password_hash {
            account.password_hash = password_hash.clone();
        }
        if let Some(capabilities) = &request.capabilities {
            account.capabilities = capabilities.clone();
        }
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn bump_token_generation(&self, id: AccountId) -> Result<i32> {
        let mut state = self.state.write();
        let account = state.accounts.get_mut(&id).ok_or_else(|| WorkflowError::not_found("Account", id))?;
        account.token_generation += 1;
        account.updated_at = Utc::now();
        Ok(account.token_generation)
    }

    async fn delete_account(&self, id: AccountId) -> Result<Option<Vec<String>>> {
        let mut state = self.state.write();
        if state.accounts.remove(&id).is_none() {
            return Ok(None);
        }
        state.profiles.remove(&id);
        state.sequence.remove(&id);

        let mut file_references = Vec::new();
        let worker_profile_id = state.worker_for_account(id).map(|w| w.id);
        if let Some(worker_profile_id) = worker_profile_id {
            state.worker_profiles.remove(&worker_profile_id);
            state.sequence.remove(&worker_profile_id);

            let owned: Vec<DocumentId> = state
                .documents
                .values()
                .filter(|d| d.worker_profile_id == worker_profile_id)
                .map(|d| d.id)
                .collect();
            for document_id in owned {
                if let Some(document) = state.documents.remove(&document_id) {
                    file_references.push(document.file_reference);
                }
                state.sequence.remove(&document_id);
            }
        }

        // ON DELETE SET NULL for reviewer references
        for worker_profile in state.worker_profiles.values_mut() {
            if worker_profile.verified_by == Some(id) {
                worker_profile.verified_by = None;
            }
        }
        for document in state.documents.values_mut() {
            if document.reviewed_by == Some(id) {
                document.reviewed_by = None;
            }
        }

        Ok(Some(file_references))
    }

    async fn get_profile(&self, account_id: AccountId) -> Result<Option<ProfileDBResponse>> {
        Ok(self.state.read().profiles.get(&account_id).cloned())
    }

    async fn update_profile(&self, account_id: AccountId, request: &ProfileUpdateDBRequest) -> Result<ProfileDBResponse> {
        let mut state = self.state.write();
        let profile = state
            .profiles
            .get_mut(&account_id)
            .ok_or_else(|| WorkflowError::not_found("Profile", account_id))?;

        if request.current_latitude.is_some() {
            profile.current_latitude = request.current_latitude;
        }
        if request.current_longitude.is_some() {
            profile.current_longitude = request.current_longitude;
        }
        if let Some(address) = &request.current_address {
            profile.current_address = Some(address.clone());
        }
        if let Some(radius) = request.preferred_radius_km {
            profile.preferred_radius_km = radius;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn promote_to_worker(
        &self,
        request: WorkerProfileCreateDBRequest,
    ) -> Result<(AccountDBResponse, WorkerProfileDBResponse)> {
        let mut state = self.state.write();
        let account_id = request.account_id;

        let role = state
            .accounts
            .get(&account_id)
            .map(|a| a.role)
            .ok_or_else(|| WorkflowError::not_found("Account", account_id))?;
        if role == AccountRole::Worker || state.worker_for_account(account_id).is_some() {
            return Err(WorkflowError::AlreadyWorker { account_id });
        }

        let now = Utc::now();
        let worker_profile = WorkerProfileDBResponse {
            id: Uuid::new_v4(),
            account_id,
            verification_status: VerificationStatus::Unverified,
            verified_at: None,
            verified_by: None,
            rejection_reason: None,
            availability_status: AvailabilityStatus::Inactive,
            service_category: request.service_category,
            skills: request.skills,
            bio: request.bio,
            hourly_rate: request.hourly_rate,
            service_latitude: request.service_latitude,
            service_longitude: request.service_longitude,
            service_radius_km: request.service_radius_km.unwrap_or_else(default_service_radius),
            average_rating: Decimal::ZERO,
            total_reviews: 0,
            total_jobs_completed: 0,
            created_at: now,
            updated_at: now,
        };

        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| WorkflowError::not_found("Account", account_id))?;
        account.role = AccountRole::Worker;
        account.updated_at = now;
        let account = account.clone();

        state.record_insert(worker_profile.id);
        state.worker_profiles.insert(worker_profile.id, worker_profile.clone());
        Ok((account, worker_profile))
    }

    async fn get_worker_profile(&self, id: WorkerProfileId) -> Result<Option<WorkerProfileDBResponse>> {
        Ok(self.state.read().worker_profiles.get(&id).cloned())
    }

    async fn get_worker_profile_by_account(&self, account_id: AccountId) -> Result<Option<WorkerProfileDBResponse>> {
        Ok(self.state.read().worker_for_account(account_id).cloned())
    }

    async fn update_worker_profile(
        &self,
        id: WorkerProfileId,
        request: &WorkerProfileUpdateDBRequest,
    ) -> Result<WorkerProfileDBResponse> {
        let mut state = self.state.write();
        let worker_profile = state
            .worker_profiles
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("Worker profile", id))?;

        if let Some(category) = request.service_category {
            worker_profile.service_category = category;
        }
        if let Some(skills) = &request.skills {
            worker_profile.skills = Some(skills.clone());
        }
        if let Some(bio) = &request.bio {
            worker_profile.bio = Some(bio.clone());
        }
        if request.hourly_rate.is_some() {
            worker_profile.hourly_rate = request.hourly_rate;
        }
        if request.service_latitude.is_some() {
            worker_profile.service_latitude = request.service_latitude;
        }
        if request.service_longitude.is_some() {
            worker_profile.service_longitude = request.service_longitude;
        }
        if let Some(radius) = request.service_radius_km {
            worker_profile.service_radius_km = radius;
        }
        if let Some(availability) = request.availability_status {
            worker_profile.availability_status = availability;
        }
        worker_profile.updated_at = Utc::now();
        Ok(worker_profile.clone())
    }

    async fn list_worker_profiles(&self, filter: &WorkerProfileFilter) -> Result<Vec<WorkerProfileDBResponse>> {
        let state = self.state.read();
        let matching = state
            .worker_profiles
            .values()
            .filter(|w| filter.verification_status.is_none_or(|s| w.verification_status == s))
            .filter(|w| filter.availability_status.is_none_or(|s| w.availability_status == s))
            .filter(|w| filter.service_category.is_none_or(|c| w.service_category == c))
            .collect();
        Ok(state.newest_first(matching, |w| w.id, filter.skip, filter.limit))
    }

    async fn attach_document(&self, request: DocumentCreateDBRequest) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)> {
        let mut state = self.state.write();

        let worker_profile = state
            .worker_profiles
            .get(&request.worker_profile_id)
            .cloned()
            .ok_or_else(|| WorkflowError::not_found("Worker profile", request.worker_profile_id))?;

        let document = DocumentDBResponse {
            id: Uuid::new_v4(),
            worker_profile_id: request.worker_profile_id,
            document_type: request.document_type,
            document_number: request.document_number,
            file_reference: request.file_reference,
            content_type: request.content_type,
            size_bytes: request.size_bytes,
            status: DocumentStatus::Pending,
            reviewer_note: None,
            reviewed_at: None,
            reviewed_by: None,
            uploaded_at: Utc::now(),
        };
        state.record_insert(document.id);
        state.documents.insert(document.id, document.clone());

        let next = worker_profile.verification_status.after_submission();
        let worker_profile = if next != worker_profile.verification_status {
            let change = VerificationChange::to(&worker_profile, next, None, None);
            state.apply_verification(worker_profile.id, change)?
        } else {
            worker_profile
        };

        Ok((document, worker_profile))
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentDBResponse>> {
        Ok(self.state.read().documents.get(&id).cloned())
    }

    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentDBResponse>> {
        let state = self.state.read();
        let matching = state
            .documents
            .values()
            .filter(|d| filter.worker_profile_id.is_none_or(|id| d.worker_profile_id == id))
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .filter(|d| filter.document_type.is_none_or(|t| d.document_type == t))
            .collect();
        Ok(state.newest_first(matching, |d| d.id, filter.skip, filter.limit))
    }

    async fn record_decision(
        &self,
        document_id: DocumentId,
        review: DocumentReviewDBRequest,
    ) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)> {
        let mut state = self.state.write();

        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| WorkflowError::not_found("Document", document_id))?;
        document.status = review.status;
        document.reviewed_by = Some(review.reviewed_by);
        document.reviewer_note = review.reviewer_note.clone();
        document.reviewed_at = Some(Utc::now());
        let document = document.clone();

        let worker_profile = state
            .worker_profiles
            .get(&document.worker_profile_id)
            .cloned()
            .ok_or_else(|| WorkflowError::not_found("Worker profile", document.worker_profile_id))?;
        let statuses: Vec<DocumentStatus> = state
            .documents
            .values()
            .filter(|d| d.worker_profile_id == worker_profile.id)
            .map(|d| d.status)
            .collect();

        let current = worker_profile.verification_status;
        let next = current.after_decision(statuses);
        let worker_profile = if next != current || (next == VerificationStatus::Rejected && review.reviewer_note.is_some()) {
            let change = VerificationChange::to(&worker_profile, next, Some(review.reviewed_by), review.reviewer_note.as_deref());
            state.apply_verification(worker_profile.id, change)?
        } else {
            worker_profile
        };

        Ok((document, worker_profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::documents::DocumentType;
    use crate::api::models::workers::ServiceCategory;

    fn account_request(email: &str, username: &str, phone: &str) -> AccountCreateDBRequest {
        AccountCreateDBRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Asha".to_string(),
            last_name: "Gurung".to_string(),
            phone_number: Some(phone.to_string()),
            password_hash: "hash".to_string(),
            role: AccountRole::Regular,
            capabilities: vec![],
        }
    }

    fn cleaner(account_id: AccountId) -> WorkerProfileCreateDBRequest {
        WorkerProfileCreateDBRequest {
            account_id,
            service_category: ServiceCategory::Cleaner,
            skills: None,
            bio: None,
            hourly_rate: None,
            service_latitude: None,
            service_longitude: None,
            service_radius_km: None,
        }
    }

    fn document(worker_profile_id: WorkerProfileId, key: &str) -> DocumentCreateDBRequest {
        DocumentCreateDBRequest {
            worker_profile_id,
            document_type: DocumentType::NinCard,
            document_number: "NIN-1".to_string(),
            file_reference: key.to_string(),
            content_type: "image/png".to_string(),
            size_bytes: 10,
        }
    }

    #[tokio::test]
    async fn test_unique_identifiers() {
        let store = MemoryStore::new();
        store
            .create_account(account_request("asha@example.com", "asha", "+9779811111111"))
            .await
            .unwrap();

        let err = store
            .create_account(account_request("asha@example.com", "asha2", "+9779822222222"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateIdentifier { field: "email" }));

        let err = store
            .create_account(account_request("other@example.com", "other", "+9779811111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateIdentifier { field: "phone_number" }));

        assert_eq!(store.account_count(), 1);
        assert_eq!(store.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_nulls_reviewer() {
        let store = MemoryStore::new();
        let (worker, _) = store
            .create_account(account_request("w@example.com", "w", "+9779811111111"))
            .await
            .unwrap();
        let (reviewer, _) = store
            .create_account(account_request("r@example.com", "r", "+9779822222222"))
            .await
            .unwrap();
        let (_, worker_profile) = store.promote_to_worker(cleaner(worker.id)).await.unwrap();
        let (doc, _) = store.attach_document(document(worker_profile.id, "aa/1.dat")).await.unwrap();
        store
            .record_decision(
                doc.id,
                DocumentReviewDBRequest {
                    status: DocumentStatus::Approved,
                    reviewed_by: reviewer.id,
                    reviewer_note: None,
                },
            )
            .await
            .unwrap();

        // Deleting the reviewer keeps the worker but forgets who reviewed
        assert_eq!(store.delete_account(reviewer.id).await.unwrap(), Some(vec![]));
        let remaining = store.get_worker_profile(worker_profile.id).await.unwrap().unwrap();
        assert_eq!(remaining.verification_status, VerificationStatus::Approved);
        assert!(remaining.verified_by.is_none());
        assert!(store.get_document(doc.id).await.unwrap().unwrap().reviewed_by.is_none());

        assert_eq!(store.delete_account(worker.id).await.unwrap(), Some(vec!["aa/1.dat".to_string()]));
        assert_eq!(store.account_count(), 0);
        assert_eq!(store.profile_count(), 0);
        assert_eq!(store.worker_profile_count(), 0);
        assert_eq!(store.document_count(), 0);

        assert_eq!(store.delete_account(worker.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_listings_are_newest_first_and_paginated() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_account(account_request(
                    &format!("user{i}@example.com"),
                    &format!("user{i}"),
                    &format!("+97798000000{i:02}"),
                ))
                .await
                .unwrap();
        }

        let page = store.list_accounts(&AccountFilter::new(1, 2)).await.unwrap();
        let names: Vec<_> = page.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, vec!["user3", "user2"]);

        let found = store.list_accounts(&AccountFilter::new(0, 10).with_search("USER4")).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
