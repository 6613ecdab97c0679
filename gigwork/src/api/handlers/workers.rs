use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::{
        accounts::CurrentAccount,
        workers::{BecomeWorkerRequest, WorkerProfileResponse, WorkerProfileUpdate},
    },
    errors::Error,
    AppState,
};

/// Promote the current account to a worker
#[utoipa::path(
    post,
    path = "/api/v1/become-worker",
    request_body = BecomeWorkerRequest,
    tag = "workers",
    responses(
        (status = 201, description = "Worker profile created, UNVERIFIED", body = WorkerProfileResponse),
        (status = 400, description = "Invalid input, or the account is an administrator"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Already a worker"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn become_worker(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(request): Json<BecomeWorkerRequest>,
) -> Result<(StatusCode, Json<WorkerProfileResponse>), Error> {
    let worker_profile = state.workflow.become_worker(current.id, request).await?;
    Ok((StatusCode::CREATED, Json(WorkerProfileResponse::from(worker_profile))))
}

/// Get the current account's worker profile
#[utoipa::path(
    get,
    path = "/api/v1/worker/profile",
    tag = "workers",
    responses(
        (status = 200, description = "Worker profile", body = WorkerProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not a worker; become a worker first"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_worker_profile(State(state): State<AppState>, current: CurrentAccount) -> Result<Json<WorkerProfileResponse>, Error> {
    let worker_profile = state.workflow.get_worker_profile(current.id).await?;
    Ok(Json(WorkerProfileResponse::from(worker_profile)))
}

/// Update descriptive fields and availability of the current account's worker profile
#[utoipa::path(
    patch,
    path = "/api/v1/worker/profile",
    request_body = WorkerProfileUpdate,
    tag = "workers",
    responses(
        (status = 200, description = "Updated worker profile", body = WorkerProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not a worker"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_worker_profile(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(update): Json<WorkerProfileUpdate>,
) -> Result<Json<WorkerProfileResponse>, Error> {
    let worker_profile = state.workflow.update_worker_profile(current.id, update).await?;
    Ok(Json(WorkerProfileResponse::from(worker_profile)))
}
