//! Administrative endpoints. Every handler requires the ADMIN capability and an action registered
//! for the entity kind in the admin registry.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    api::models::{
        accounts::{AccountResponse, CurrentAccount, ListAccountsQuery},
        documents::{DecisionRequest, DecisionResponse, DocumentResponse, ListDocumentsQuery},
        workers::{ListWorkersQuery, WorkerProfileResponse},
    },
    db::handlers::{accounts::AccountFilter, documents::DocumentFilter, worker_profiles::WorkerProfileFilter},
    errors::Error,
    types::{AccountId, DocumentId},
    verification::registry::RegisteredEntity,
    AppState,
};

/// List accounts
#[utoipa::path(
    get,
    path = "/admin/api/v1/accounts",
    tag = "admin",
    params(ListAccountsQuery),
    responses(
        (status = 200, description = "Accounts, newest first", body = [AccountResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Administrator capability required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_accounts(
    State(state): State<AppState>,
    current: CurrentAccount,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<Vec<AccountResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let mut filter = AccountFilter::new(skip, limit);
    if let Some(role) = query.role {
        filter = filter.with_role(role);
    }
    if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
        filter = filter.with_search(search.trim());
    }

    let accounts = state.workflow.admin_list_accounts(&current, &filter).await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Delete an account together with everything it owns
#[utoipa::path(
    delete,
    path = "/admin/api/v1/accounts/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Account ID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Administrator capability required"),
        (status = 404, description = "Account not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_account(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(id): Path<AccountId>,
) -> Result<StatusCode, Error> {
    state.workflow.admin_delete_account(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List worker profiles
#[utoipa::path(
    get,
    path = "/admin/api/v1/workers",
    tag = "admin",
    params(ListWorkersQuery),
    responses(
        (status = 200, description = "Worker profiles, newest first", body = [WorkerProfileResponse]),
        (status = 403, description = "Administrator capability required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_workers(
    State(state): State<AppState>,
    current: CurrentAccount,
    Query(query): Query<ListWorkersQuery>,
) -> Result<Json<Vec<WorkerProfileResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = WorkerProfileFilter {
        verification_status: query.verification_status,
        availability_status: query.availability_status,
        service_category: query.service_category,
        ..WorkerProfileFilter::new(skip, limit)
    };

    let workers = state.workflow.admin_list_workers(&current, &filter).await?;
    Ok(Json(workers.into_iter().map(WorkerProfileResponse::from).collect()))
}

/// List documents across all workers
#[utoipa::path(
    get,
    path = "/admin/api/v1/documents",
    tag = "admin",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Documents, newest first", body = [DocumentResponse]),
        (status = 403, description = "Administrator capability required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_documents(
    State(state): State<AppState>,
    current: CurrentAccount,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let filter = DocumentFilter {
        worker_profile_id: query.worker_profile_id,
        status: query.status,
        document_type: query.document_type,
        ..DocumentFilter::new(skip, limit)
    };

    let documents = state.workflow.admin_list_documents(&current, &filter).await?;
    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

/// Get a single document
#[utoipa::path(
    get,
    path = "/admin/api/v1/documents/{id}",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 403, description = "Administrator capability required"),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_document(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>, Error> {
    let document = state.workflow.admin_get_document(&current, id).await?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Download the stored file of a document
#[utoipa::path(
    get,
    path = "/admin/api/v1/documents/{id}/content",
    tag = "admin",
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File content with its original content type", content_type = "application/octet-stream"),
        (status = 403, description = "Administrator capability required"),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_document_content(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(id): Path<DocumentId>,
) -> Result<impl IntoResponse, Error> {
    let (content, content_type) = state.workflow.admin_document_content(&current, id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], content))
}

/// Approve or reject a document
///
/// The worker profile's verification status is recomputed from all of its documents.
#[utoipa::path(
    post,
    path = "/admin/api/v1/documents/{id}/decision",
    tag = "admin",
    request_body = DecisionRequest,
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Decision recorded", body = DecisionResponse),
        (status = 403, description = "Administrator capability required, or decision not allowed"),
        (status = 404, description = "Document not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn decide(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(id): Path<DocumentId>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, Error> {
    let (document, worker_profile) = state.workflow.decide(&current, id, request.outcome, request.note).await?;
    Ok(Json(DecisionResponse {
        document: DocumentResponse::from(document),
        worker_profile: WorkerProfileResponse::from(worker_profile),
    }))
}

/// Entity kinds exposed to administrators and their allowed actions
#[utoipa::path(
    get,
    path = "/admin/api/v1/registry",
    tag = "admin",
    responses(
        (status = 200, description = "Registered entity kinds", body = [RegisteredEntity]),
        (status = 403, description = "Administrator capability required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_registry(State(state): State<AppState>, current: CurrentAccount) -> Result<Json<Vec<RegisteredEntity>>, Error> {
    Ok(Json(state.workflow.admin_registry(&current)?))
}
