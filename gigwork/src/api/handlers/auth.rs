use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::{
        accounts::{AccountResponse, CurrentAccount},
        auth::{AccessTokenResponse, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest, TokenPairResponse},
    },
    errors::Error,
    AppState,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/authentication/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Account registered", body = AccountResponse),
        (status = 400, description = "Invalid input or registration disabled"),
        (status = 409, description = "E-mail or phone number already in use"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), Error> {
    let (account, _profile) = state.workflow.register(request).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Log in with e-mail and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenPairResponse>, Error> {
    let pair = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
        account: AccountResponse::from(pair.account),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/authentication/refresh",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<Json<AccessTokenResponse>, Error> {
    let access = state.auth.refresh(&request.refresh).await?;
    Ok(Json(AccessTokenResponse { access }))
}

/// Revoke every token issued to the current account
#[utoipa::path(
    post,
    path = "/authentication/logout-all",
    tag = "authentication",
    responses(
        (status = 200, description = "All tokens revoked", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn logout_all(State(state): State<AppState>, current: CurrentAccount) -> Result<Json<MessageResponse>, Error> {
    state.auth.invalidate_all(current.id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out of all sessions".to_string(),
    }))
}
