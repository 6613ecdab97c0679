//! The worker verification workflow.
//!
//! [`VerificationWorkflow`] owns every state change in the system: registration, promotion to
//! worker, document submission, administrative decisions and account deletion. HTTP handlers
//! only translate requests into calls here, so the rules (validation, ownership, capability and
//! registry checks, status transitions) hold for every caller.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::models::{
    accounts::{AccountRole, Capability, CurrentAccount},
    auth::RegisterRequest,
    documents::DocumentType,
    profiles::ProfileUpdate,
    workers::{BecomeWorkerRequest, WorkerProfileUpdate},
};
use crate::auth::password::{self, Argon2Params};
use crate::config::Config;
use crate::db::handlers::{
    accounts::AccountFilter, documents::DocumentFilter, file_storage::FileStorage, worker_profiles::WorkerProfileFilter,
};
use crate::db::models::{
    accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
    documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentReviewDBRequest},
    file_storage::FileStorageRequest,
    profiles::{ProfileDBResponse, ProfileUpdateDBRequest},
    worker_profiles::{WorkerProfileCreateDBRequest, WorkerProfileDBResponse, WorkerProfileUpdateDBRequest},
};
use crate::store::AccountStore;
use crate::types::{abbrev_uuid, AccountId, DocumentId, WorkerProfileId};
use crate::verification::{
    errors::{Result, WorkflowError},
    registry::{AdminAction, AdminRegistry, EntityKind, RegisteredEntity},
    status::DecisionOutcome,
    validation,
};

const MAX_USERNAME_BASE_LENGTH: usize = 140;
const MAX_ADDRESS_LENGTH: usize = 255;
/// Attempts at claiming a derived username before giving up on a racing registration
const USERNAME_ATTEMPTS: usize = 3;

/// Tunables the workflow reads from configuration
#[derive(Debug, Clone)]
pub struct WorkflowPolicy {
    pub allow_registration: bool,
    pub min_password_length: usize,
    pub max_password_length: usize,
    pub argon2: Argon2Params,
    pub max_file_size: u64,
    pub allowed_content_types: Vec<String>,
}

impl From<&Config> for WorkflowPolicy {
    fn from(config: &Config) -> Self {
        let native = &config.auth.native;
        Self {
            allow_registration: native.allow_registration,
            min_password_length: native.password.min_length,
            max_password_length: native.password.max_length,
            argon2: Argon2Params::from(&native.password),
            max_file_size: config.files.max_file_size,
            allowed_content_types: config.files.allowed_content_types.clone(),
        }
    }
}

/// A file uploaded as identity evidence
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub document_type: DocumentType,
    pub document_number: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

#[derive(Clone)]
pub struct VerificationWorkflow {
    store: Arc<dyn AccountStore>,
    files: Arc<dyn FileStorage>,
    registry: Arc<AdminRegistry>,
    policy: WorkflowPolicy,
}

/// Derive the base of a username from an e-mail address
fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'))
        .take(MAX_USERNAME_BASE_LENGTH)
        .collect();
    if base.is_empty() { "user".to_string() } else { base }
}

/// The capability an administrative action needs on top of ADMIN
fn required_capability(kind: EntityKind, action: AdminAction) -> Option<Capability> {
    match (kind, action) {
        (EntityKind::Document, AdminAction::Approve | AdminAction::Reject) => Some(Capability::VerifyWorkers),
        (EntityKind::Account, _) => Some(Capability::ManageUsers),
        _ => None,
    }
}

fn non_empty(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl VerificationWorkflow {
    pub fn new(store: Arc<dyn AccountStore>, files: Arc<dyn FileStorage>, registry: Arc<AdminRegistry>, policy: WorkflowPolicy) -> Self {
        Self {
            store,
            files,
            registry,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Fail unless the actor holds ADMIN plus any capability the action needs, and `action` is
    /// registered for `kind`
    fn require_admin(&self, actor: &CurrentAccount, kind: EntityKind, action: AdminAction) -> Result<()> {
        if !actor.is_admin() {
            return Err(WorkflowError::unauthorized("Administrator capability required"));
        }
        if let Some(capability) = required_capability(kind, action) {
            if !actor.has_capability(capability) {
                return Err(WorkflowError::unauthorized(format!("{capability:?} capability required")));
            }
        }
        self.registry.require(kind, action)
    }

    async fn unique_username(&self, email: &str) -> Result<String> {
        let base = username_base(email);
        if !self.store.username_exists(&base).await? {
            return Ok(base);
        }
        let mut suffix = 1u32;
        loop {
            let candidate = format!("{base}{suffix}");
            if !self.store.username_exists(&candidate).await? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    // ------------------------------------------------------------------------
    // Registration & accounts
    // ------------------------------------------------------------------------

    /// Create an account and its profile in one step.
    #[instrument(skip_all, err)]
    pub async fn register(&self, request: RegisterRequest) -> Result<(AccountDBResponse, ProfileDBResponse)> {
        if !self.policy.allow_registration {
            return Err(WorkflowError::Validation {
                field: None,
                message: "Self-registration is disabled".to_string(),
            });
        }

        let email = validation::normalize_email(&request.email)?;
        let first_name = request.first_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();
        let phone_number = request.phone_number.trim().to_string();
        validation::name("first_name", &first_name)?;
        validation::name("last_name", &last_name)?;
        validation::phone_number(&phone_number)?;
        validation::passwords(
            &request.password,
            &request.password2,
            self.policy.min_password_length,
            self.policy.max_password_length,
        )?;

        // Fail fast on a taken e-mail before paying for the hash
        if self.store.get_account_by_email(&email).await?.is_some() {
            return Err(WorkflowError::DuplicateIdentifier { field: "email" });
        }

        let password_hash = password::hash_blocking(request.password, self.policy.argon2).await?;

        let mut attempt = 0;
        let (account, profile) = loop {
            attempt += 1;
            let create = AccountCreateDBRequest {
                email: email.clone(),
                username: self.unique_username(&email).await?,
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                phone_number: Some(phone_number.clone()),
                password_hash: password_hash.clone(),
                role: AccountRole::Regular,
                capabilities: vec![],
            };
            match self.store.create_account(create).await {
                // Someone claimed the same derived username in between, pick the next one
                Err(WorkflowError::DuplicateIdentifier { field: "username" }) if attempt < USERNAME_ATTEMPTS => continue,
                other => break other?,
            }
        };

        metrics::counter!("gigwork_accounts_registered_total").increment(1);
        info!(account_id = %abbrev_uuid(&account.id), "Registered account");
        Ok((account, profile))
    }

    /// Create the initial administrator, or refresh its password and capabilities if it exists.
    #[instrument(skip(self, password), err)]
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<AccountDBResponse> {
        let email = validation::normalize_email(email)?;
        let password_hash = password::hash_blocking(password.to_string(), self.policy.argon2).await?;

        if let Some(existing) = self.store.get_account_by_email(&email).await? {
            let update = AccountUpdateDBRequest {
                password_hash: Some(password_hash),
                capabilities: Some(Capability::ALL.to_vec()),
                ..Default::default()
            };
            return self.store.update_account(existing.id, &update).await;
        }

        let create = AccountCreateDBRequest {
            username: self.unique_username(&email).await?,
            email,
            first_name: "Site".to_string(),
            last_name: "Administrator".to_string(),
            phone_number: None,
            password_hash,
            role: AccountRole::Regular,
            capabilities: Capability::ALL.to_vec(),
        };
        let (account, _) = self.store.create_account(create).await?;
        info!(account_id = %abbrev_uuid(&account.id), "Created initial admin account");
        Ok(account)
    }

    pub async fn get_account(&self, account_id: AccountId) -> Result<AccountDBResponse> {
        self.store
            .get_account(account_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Account", account_id))
    }

    /// Delete an account with everything it owns, then remove its stored files.
    ///
    /// Token invalidation is the authentication service's job: [`crate::auth::AuthService`]
    /// reloads the account behind every access and refresh token and rejects those whose
    /// account is gone, which covers every token issued before the deletion.
    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn delete_account(&self, account_id: AccountId) -> Result<()> {
        let file_references = self
            .store
            .delete_account(account_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Account", account_id))?;

        for key in &file_references {
            if let Err(e) = self.files.delete(key).await {
                warn!(key = %key, error = %e, "Failed to remove stored file of deleted account");
            }
        }

        metrics::counter!("gigwork_accounts_deleted_total").increment(1);
        info!(files = file_references.len(), "Deleted account");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------------

    pub async fn get_profile(&self, account_id: AccountId) -> Result<ProfileDBResponse> {
        self.store
            .get_profile(account_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Profile", account_id))
    }

    #[instrument(skip(self, update), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn update_profile(&self, account_id: AccountId, update: ProfileUpdate) -> Result<ProfileDBResponse> {
        validation::latitude("current_latitude", update.current_latitude)?;
        validation::longitude("current_longitude", update.current_longitude)?;
        validation::preferred_radius(update.preferred_radius_km)?;
        if update.current_address.as_ref().is_some_and(|a| a.chars().count() > MAX_ADDRESS_LENGTH) {
            return Err(WorkflowError::validation(
                "current_address",
                format!("Ensure this field has no more than {MAX_ADDRESS_LENGTH} characters."),
            ));
        }

        let request = ProfileUpdateDBRequest {
            current_latitude: update.current_latitude,
            current_longitude: update.current_longitude,
            current_address: update.current_address,
            preferred_radius_km: update.preferred_radius_km,
        };
        self.store.update_profile(account_id, &request).await
    }

    // ------------------------------------------------------------------------
    // Worker promotion
    // ------------------------------------------------------------------------

    /// Promote an account to worker, creating its UNVERIFIED worker profile.
    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn become_worker(&self, account_id: AccountId, request: BecomeWorkerRequest) -> Result<WorkerProfileDBResponse> {
        let account = self.get_account(account_id).await?;
        if account.capabilities.contains(&Capability::Admin) {
            return Err(WorkflowError::Validation {
                field: None,
                message: "Administrator accounts cannot become workers".to_string(),
            });
        }

        validation::bio(request.bio.as_deref())?;
        validation::hourly_rate(request.hourly_rate)?;
        validation::latitude("service_latitude", request.service_latitude)?;
        validation::longitude("service_longitude", request.service_longitude)?;
        validation::service_radius(request.service_radius_km)?;

        let create = WorkerProfileCreateDBRequest {
            account_id,
            service_category: request.service_category,
            skills: request.skills,
            bio: request.bio,
            hourly_rate: request.hourly_rate,
            service_latitude: request.service_latitude,
            service_longitude: request.service_longitude,
            service_radius_km: request.service_radius_km,
        };
        let (_, worker_profile) = self.store.promote_to_worker(create).await?;

        metrics::counter!("gigwork_workers_promoted_total").increment(1);
        info!(worker_profile_id = %abbrev_uuid(&worker_profile.id), "Account became a worker");
        Ok(worker_profile)
    }

    pub async fn get_worker_profile(&self, account_id: AccountId) -> Result<WorkerProfileDBResponse> {
        self.store
            .get_worker_profile_by_account(account_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Worker profile for account", account_id))
    }

    /// Update the descriptive fields of the caller's worker profile
    #[instrument(skip(self, update), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn update_worker_profile(&self, account_id: AccountId, update: WorkerProfileUpdate) -> Result<WorkerProfileDBResponse> {
        validation::bio(update.bio.as_deref())?;
        validation::hourly_rate(update.hourly_rate)?;
        validation::latitude("service_latitude", update.service_latitude)?;
        validation::longitude("service_longitude", update.service_longitude)?;
        validation::service_radius(update.service_radius_km)?;

        let worker_profile = self.get_worker_profile(account_id).await?;
        let request = WorkerProfileUpdateDBRequest {
            service_category: update.service_category,
            skills: update.skills,
            bio: update.bio,
            hourly_rate: update.hourly_rate,
            service_latitude: update.service_latitude,
            service_longitude: update.service_longitude,
            service_radius_km: update.service_radius_km,
            availability_status: update.availability_status,
        };
        self.store.update_worker_profile(worker_profile.id, &request).await
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    /// Store an uploaded file and attach it as a PENDING document to the worker profile.
    ///
    /// The profile moves to PENDING unless it is already pending or approved. If attaching the
    /// document fails the stored file is removed again.
    #[instrument(
        skip(self, actor, upload),
        fields(actor = %abbrev_uuid(&actor.id), worker_profile_id = %abbrev_uuid(&worker_profile_id), document_type = ?upload.document_type),
        err
    )]
    pub async fn submit_document(
        &self,
        actor: &CurrentAccount,
        worker_profile_id: WorkerProfileId,
        upload: DocumentUpload,
    ) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)> {
        let worker_profile = self
            .store
            .get_worker_profile(worker_profile_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Worker profile", worker_profile_id))?;
        if worker_profile.account_id != actor.id {
            return Err(WorkflowError::unauthorized(
                "Documents can only be submitted for your own worker profile",
            ));
        }

        let document_number = upload.document_number.trim().to_string();
        validation::document_number(&document_number)?;
        validation::upload(
            upload.content.len(),
            &upload.content_type,
            self.policy.max_file_size,
            &self.policy.allowed_content_types,
        )?;

        let size_bytes = upload.content.len() as i64;
        let stored = self
            .files
            .store(FileStorageRequest {
                content: upload.content,
                content_type: upload.content_type.clone(),
            })
            .await?;

        let create = DocumentCreateDBRequest {
            worker_profile_id,
            document_type: upload.document_type,
            document_number,
            file_reference: stored.storage_key.clone(),
            content_type: upload.content_type,
            size_bytes,
        };
        let (document, worker_profile) = match self.store.attach_document(create).await {
            Ok(attached) => attached,
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&stored.storage_key).await {
                    warn!(key = %stored.storage_key, error = %cleanup, "Failed to remove file of unattached document");
                }
                return Err(e);
            }
        };

        metrics::counter!("gigwork_documents_submitted_total").increment(1);
        info!(
            document_id = %abbrev_uuid(&document.id),
            status = %worker_profile.verification_status,
            "Document submitted"
        );
        Ok((document, worker_profile))
    }

    /// The caller's own documents, newest first. Empty for accounts that are not workers.
    pub async fn list_own_documents(&self, account_id: AccountId, skip: i64, limit: i64) -> Result<Vec<DocumentDBResponse>> {
        match self.store.get_worker_profile_by_account(account_id).await? {
            Some(worker_profile) => {
                let filter = DocumentFilter::new(skip, limit).for_worker(worker_profile.id);
                self.store.list_documents(&filter).await
            }
            None => Ok(vec![]),
        }
    }

    /// Record an administrator's decision on a document and recompute the worker's status.
    #[instrument(
        skip(self, actor, note),
        fields(actor = %abbrev_uuid(&actor.id), document_id = %abbrev_uuid(&document_id), outcome = outcome.as_str()),
        err
    )]
    pub async fn decide(
        &self,
        actor: &CurrentAccount,
        document_id: DocumentId,
        outcome: DecisionOutcome,
        note: Option<String>,
    ) -> Result<(DocumentDBResponse, WorkerProfileDBResponse)> {
        let action = match outcome {
            DecisionOutcome::Approved => AdminAction::Approve,
            DecisionOutcome::Rejected => AdminAction::Reject,
        };
        self.require_admin(actor, EntityKind::Document, action)?;

        let review = DocumentReviewDBRequest {
            status: outcome.into(),
            reviewed_by: actor.id,
            reviewer_note: non_empty(note),
        };
        let (document, worker_profile) = self.store.record_decision(document_id, review).await?;

        metrics::counter!("gigwork_document_decisions_total", "outcome" => outcome.as_str()).increment(1);
        info!(
            worker_profile_id = %abbrev_uuid(&worker_profile.id),
            status = %worker_profile.verification_status,
            "Decision recorded"
        );
        Ok((document, worker_profile))
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    pub async fn admin_list_accounts(&self, actor: &CurrentAccount, filter: &AccountFilter) -> Result<Vec<AccountDBResponse>> {
        self.require_admin(actor, EntityKind::Account, AdminAction::View)?;
        self.store.list_accounts(filter).await
    }

    pub async fn admin_delete_account(&self, actor: &CurrentAccount, account_id: AccountId) -> Result<()> {
        self.require_admin(actor, EntityKind::Account, AdminAction::Delete)?;
        self.delete_account(account_id).await
    }

    pub async fn admin_list_workers(&self, actor: &CurrentAccount, filter: &WorkerProfileFilter) -> Result<Vec<WorkerProfileDBResponse>> {
        self.require_admin(actor, EntityKind::WorkerProfile, AdminAction::View)?;
        self.store.list_worker_profiles(filter).await
    }

    pub async fn admin_list_documents(&self, actor: &CurrentAccount, filter: &DocumentFilter) -> Result<Vec<DocumentDBResponse>> {
        self.require_admin(actor, EntityKind::Document, AdminAction::View)?;
        self.store.list_documents(filter).await
    }

    pub async fn admin_get_document(&self, actor: &CurrentAccount, document_id: DocumentId) -> Result<DocumentDBResponse> {
        self.require_admin(actor, EntityKind::Document, AdminAction::View)?;
        self.store
            .get_document(document_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Document", document_id))
    }

    /// Entity kinds exposed to administrators and the actions allowed on each
    pub fn admin_registry(&self, actor: &CurrentAccount) -> Result<Vec<RegisteredEntity>> {
        if !actor.is_admin() {
            return Err(WorkflowError::unauthorized("Administrator capability required"));
        }
        Ok(self.registry.entities())
    }

    /// The stored file of a document together with its content type
    pub async fn admin_document_content(&self, actor: &CurrentAccount, document_id: DocumentId) -> Result<(Vec<u8>, String)> {
        let document = self.admin_get_document(actor, document_id).await?;
        let content = self.files.retrieve(&document.file_reference).await?;
        Ok((content, document.content_type))
    }
}
