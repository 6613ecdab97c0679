//! Test utilities: in-memory configuration, an HTTP test server and workflow fixtures.

use crate::api::models::{
    accounts::CurrentAccount,
    auth::{RegisterRequest, TokenPairResponse},
    workers::{BecomeWorkerRequest, ServiceCategory},
};
use crate::config::{
    Config, DatabaseConfig, FileStorageConfig, FilesConfig, NativeAuthConfig, PasswordConfig,
};
use crate::db::errors::StorageError;
use crate::db::handlers::file_storage::{FileStorage, InMemoryFileStorage};
use crate::db::models::file_storage::{FileStorageRequest, FileStorageResponse};
use crate::db::models::worker_profiles::WorkerProfileDBResponse;
use crate::store::MemoryStore;
use crate::verification::{registry::AdminRegistry, VerificationWorkflow, WorkflowPolicy};
use crate::AppState;
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::json;
use std::sync::Arc;

pub const TEST_PASSWORD: &str = "s3cure-passw0rd";
pub const ADMIN_PASSWORD: &str = "admin-passw0rd";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n% test identity document\n";

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        admin_email: "admin@test.com".to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: crate::config::AuthConfig {
            native: NativeAuthConfig {
                allow_registration: true,
                // Cheap hashes keep the suite fast
                password: PasswordConfig {
                    argon2_memory_kib: 1024,
                    argon2_iterations: 1,
                    argon2_parallelism: 1,
                    ..Default::default()
                },
            },
            ..Default::default()
        },
        files: FilesConfig {
            storage: FileStorageConfig::Memory,
            max_file_size: 1024 * 1024,
            ..Default::default()
        },
        enable_metrics: false,
        enable_otel_export: false,
        ..Default::default()
    }
}

pub async fn create_test_server() -> (TestServer, AppState) {
    let app = crate::Application::new(create_test_config())
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn registration(email: &str, phone: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "Person".to_string(),
        phone_number: phone.to_string(),
        password: TEST_PASSWORD.to_string(),
        password2: TEST_PASSWORD.to_string(),
    }
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> TokenPairResponse {
    let response = server
        .post("/authentication/login")
        .json(&json!({"email": email, "password": password}))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Register a regular account over HTTP and log it in
pub async fn register_and_login(server: &TestServer, email: &str, phone: &str) -> TokenPairResponse {
    server
        .post("/authentication/register")
        .json(&registration(email, phone))
        .await
        .assert_status(StatusCode::CREATED);
    login(server, email, TEST_PASSWORD).await
}

/// Log in as the admin bootstrapped from the test configuration
pub async fn admin_login(server: &TestServer) -> TokenPairResponse {
    let config = create_test_config();
    login(server, &config.admin_email, ADMIN_PASSWORD).await
}

pub async fn become_worker(server: &TestServer, token: &str) -> serde_json::Value {
    let response = server
        .post("/api/v1/become-worker")
        .add_header("authorization", bearer(token))
        .json(&json!({"service_category": "PLUMBER"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

pub fn pdf_upload(document_type: &str, document_number: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("document_type", document_type.to_string())
        .add_text("document_number", document_number.to_string())
        .add_part("file", Part::bytes(PDF_BYTES).file_name("document.pdf").mime_type("application/pdf"))
}

// ----------------------------------------------------------------------------
// Workflow fixtures
// ----------------------------------------------------------------------------

/// File storage whose writes always fail
pub struct FailingFileStorage;

#[async_trait]
impl FileStorage for FailingFileStorage {
    async fn store(&self, _request: FileStorageRequest) -> Result<FileStorageResponse, StorageError> {
        Err(StorageError::Other(anyhow::anyhow!("disk full")))
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, _storage_key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

pub fn workflow_with_storage(store: Arc<MemoryStore>, files: Arc<dyn FileStorage>) -> VerificationWorkflow {
    let config = create_test_config();
    VerificationWorkflow::new(
        store,
        files,
        Arc::new(AdminRegistry::from_config(&config.admin)),
        WorkflowPolicy::from(&config),
    )
}

pub fn test_workflow() -> (VerificationWorkflow, Arc<MemoryStore>, Arc<InMemoryFileStorage>) {
    let store = Arc::new(MemoryStore::new());
    let files = Arc::new(InMemoryFileStorage::new());
    let workflow = workflow_with_storage(store.clone(), files.clone());
    (workflow, store, files)
}

/// Register an account and promote it to worker, returning the actor and its worker profile
pub async fn create_worker(workflow: &VerificationWorkflow, email: &str, phone: &str) -> (CurrentAccount, WorkerProfileDBResponse) {
    let (account, _) = workflow.register(registration(email, phone)).await.expect("registration failed");
    let worker_profile = workflow
        .become_worker(
            account.id,
            BecomeWorkerRequest {
                service_category: ServiceCategory::Electrician,
                skills: None,
                bio: None,
                hourly_rate: None,
                service_latitude: None,
                service_longitude: None,
                service_radius_km: None,
            },
        )
        .await
        .expect("promotion failed");
    let account = workflow.get_account(account.id).await.expect("account vanished");
    (CurrentAccount::from(&account), worker_profile)
}

pub async fn create_admin(workflow: &VerificationWorkflow) -> CurrentAccount {
    let admin = workflow
        .ensure_admin("admin@test.com", ADMIN_PASSWORD)
        .await
        .expect("admin bootstrap failed");
    CurrentAccount::from(&admin)
}
