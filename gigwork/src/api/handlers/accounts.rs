use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::accounts::{AccountResponse, CurrentAccount},
    errors::Error,
    AppState,
};

/// Get the current account
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "accounts",
    responses(
        (status = 200, description = "The authenticated account", body = AccountResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, current: CurrentAccount) -> Result<Json<AccountResponse>, Error> {
    let account = state.workflow.get_account(current.id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Delete the current account together with its profile, worker profile and documents
#[utoipa::path(
    delete,
    path = "/api/v1/me",
    tag = "accounts",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_me(State(state): State<AppState>, current: CurrentAccount) -> Result<StatusCode, Error> {
    state.workflow.delete_account(current.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
