//! Login, refresh and token revocation.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    auth::{
        password,
        session::{self, TokenType},
    },
    config::Config,
    db::models::accounts::AccountDBResponse,
    errors::{Error, Result},
    store::AccountStore,
    types::{abbrev_uuid, AccountId},
};

/// Issued tokens for a freshly authenticated account
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub account: AccountDBResponse,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    config: Config,
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("No active account found with the given credentials".to_string()),
    }
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Exchange an e-mail and password for an access/refresh token pair.
    ///
    /// An unknown e-mail and a wrong password produce the same error.
    #[instrument(skip_all, err)]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let email = email.trim().to_lowercase();
        let account = self
            .store
            .get_account_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        let valid = password::verify_blocking(password.to_string(), account.password_hash.clone())
            .await
            .map_err(|e| Error::Internal {
                operation: format!("verify password: {e}"),
            })?;
        if !valid {
            return Err(invalid_credentials());
        }

        let access = session::create_token(&account, TokenType::Access, &self.config)?;
        let refresh = session::create_token(&account, TokenType::Refresh, &self.config)?;
        info!(account_id = %abbrev_uuid(&account.id), "Login succeeded");

        Ok(TokenPair { access, refresh, account })
    }

    /// Issue a new access token for a still-valid refresh token.
    #[instrument(skip_all, err)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = session::verify_token(refresh_token, TokenType::Refresh, &self.config)?;
        let account = self.current_account(claims.sub, claims.generation).await?;
        session::create_token(&account, TokenType::Access, &self.config)
    }

    /// Resolve an access token to the account it was issued for.
    pub async fn authenticate(&self, access_token: &str) -> Result<AccountDBResponse> {
        let claims = session::verify_token(access_token, TokenType::Access, &self.config)?;
        self.current_account(claims.sub, claims.generation).await
    }

    /// Revoke every token issued to the account so far.
    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn invalidate_all(&self, account_id: AccountId) -> Result<()> {
        let generation = self.store.bump_token_generation(account_id).await?;
        info!(generation, "Revoked all tokens");
        Ok(())
    }

    /// Load the account and check that tokens of `generation` are still honoured.
    async fn current_account(&self, account_id: AccountId, generation: i32) -> Result<AccountDBResponse> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("Account no longer exists".to_string()),
            })?;
        if account.token_generation != generation {
            return Err(Error::Unauthenticated {
                message: Some("Token has been revoked".to_string()),
            });
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::accounts::AccountRole;
    use crate::auth::password::Argon2Params;
    use crate::db::models::accounts::AccountCreateDBRequest;
    use crate::store::MemoryStore;
    use crate::test_utils::create_test_config;

    async fn service_with_account(password: &str) -> (AuthService, Arc<MemoryStore>, AccountDBResponse) {
        let store = Arc::new(MemoryStore::new());
        let params = Argon2Params {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let password_hash = password::hash(password, params).unwrap();
        let (account, _) = store
            .create_account(AccountCreateDBRequest {
                email: "sita@example.com".to_string(),
                username: "sita".to_string(),
                first_name: "Sita".to_string(),
                last_name: "Sharma".to_string(),
                phone_number: Some("9800000001".to_string()),
                password_hash,
                role: AccountRole::Regular,
                capabilities: vec![],
            })
            .await
            .unwrap();

        let service = AuthService::new(store.clone(), create_test_config());
        (service, store, account)
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let (service, _, account) = service_with_account("correct horse").await;

        let pair = service.login("Sita@Example.com", "correct horse").await.unwrap();
        assert_eq!(pair.account.id, account.id);

        let authenticated = service.authenticate(&pair.access).await.unwrap();
        assert_eq!(authenticated.id, account.id);

        let access = service.refresh(&pair.refresh).await.unwrap();
        assert!(service.authenticate(&access).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _, _) = service_with_account("correct horse").await;

        let unknown = service.login("nobody@example.com", "correct horse").await.unwrap_err();
        let wrong = service.login("sita@example.com", "wrong horse").await.unwrap_err();

        assert_eq!(unknown.status_code(), wrong.status_code());
        assert_eq!(unknown.user_message(), wrong.user_message());
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let (service, _, _) = service_with_account("correct horse").await;
        let pair = service.login("sita@example.com", "correct horse").await.unwrap();

        assert!(matches!(service.refresh(&pair.access).await, Err(Error::Unauthenticated { .. })));
    }

    #[tokio::test]
    async fn test_invalidate_all_revokes_existing_tokens() {
        let (service, _, account) = service_with_account("correct horse").await;
        let pair = service.login("sita@example.com", "correct horse").await.unwrap();

        service.invalidate_all(account.id).await.unwrap();

        assert!(matches!(service.authenticate(&pair.access).await, Err(Error::Unauthenticated { .. })));
        assert!(matches!(service.refresh(&pair.refresh).await, Err(Error::Unauthenticated { .. })));

        // Tokens issued afterwards carry the new generation
        let fresh = service.login("sita@example.com", "correct horse").await.unwrap();
        assert!(service.authenticate(&fresh.access).await.is_ok());
    }

    #[tokio::test]
    async fn test_tokens_of_deleted_account_fail() {
        let (service, store, account) = service_with_account("correct horse").await;
        let pair = service.login("sita@example.com", "correct horse").await.unwrap();

        store.delete_account(account.id).await.unwrap();

        assert!(matches!(service.refresh(&pair.refresh).await, Err(Error::Unauthenticated { .. })));
    }
}
