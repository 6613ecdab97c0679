use axum::{extract::State, Json};

use crate::{
    api::models::{
        accounts::CurrentAccount,
        profiles::{ProfileResponse, ProfileUpdate},
    },
    errors::Error,
    AppState,
};

/// Get the current account's profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profiles",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current: CurrentAccount) -> Result<Json<ProfileResponse>, Error> {
    let profile = state.workflow.get_profile(current.id).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// Update location fields of the current account's profile
#[utoipa::path(
    patch,
    path = "/api/v1/profile",
    request_body = ProfileUpdate,
    tag = "profiles",
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, Error> {
    let profile = state.workflow.update_profile(current.id, update).await?;
    Ok(Json(ProfileResponse::from(profile)))
}
