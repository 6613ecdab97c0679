use crate::{
    api::models::accounts::CurrentAccount,
    errors::{Error, Result},
    AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{instrument, trace};

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts.headers.get(AUTHORIZATION).ok_or(Error::Unauthenticated { message: None })?;
    let value = header.to_str().map_err(|_| Error::Unauthenticated {
        message: Some("Authorization header is not valid ASCII".to_string()),
    })?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(Error::Unauthenticated {
            message: Some("Expected a Bearer token".to_string()),
        }),
    }
}

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;
        let account = state.auth.authenticate(token).await?;
        trace!(account_id = %account.id, "Authenticated request");
        Ok(CurrentAccount::from(&account))
    }
}
