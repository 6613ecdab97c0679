//! JWT access and refresh token creation and verification.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{config::Config, db::models::accounts::AccountDBResponse, errors::Error, types::AccountId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: AccountId, // Subject (account ID)
    /// Account token generation at issue time
    #[serde(rename = "gen")]
    pub generation: i32,
    pub typ: TokenType,
    pub iat: i64, // Issued at
    pub exp: i64, // Expiration time
    pub jti: Uuid,
}

impl TokenClaims {
    pub fn new(account: &AccountDBResponse, typ: TokenType, config: &Config) -> Self {
        let now = Utc::now();
        let lifetime = match typ {
            TokenType::Access => config.auth.security.access_token_expiry,
            TokenType::Refresh => config.auth.security.refresh_token_expiry,
        };
        let exp = now + lifetime;

        Self {
            sub: account.id,
            generation: account.token_generation,
            typ,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "sign tokens: secret_key is required".to_string(),
    })
}

/// Sign a set of claims
pub fn encode_claims(claims: &TokenClaims, config: &Config) -> Result<String, Error> {
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Create a token of the given type for an account
pub fn create_token(account: &AccountDBResponse, typ: TokenType, config: &Config) -> Result<String, Error> {
    encode_claims(&TokenClaims::new(account, typ, config), config)
}

/// Verify a token's signature and expiry and check that it is of the expected type.
///
/// This does not check the account's token generation; callers that have the account loaded
/// compare [`TokenClaims::generation`] against it.
pub fn verify_token(token: &str, expected: TokenType, config: &Config) -> Result<TokenClaims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: Some("Token is invalid or expired".to_string()),
        },

        // Server errors (500) - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    if token_data.claims.typ != expected {
        return Err(Error::Unauthenticated {
            message: Some(format!("Expected a token of type {expected}")),
        });
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::accounts::AccountRole;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        }
    }

    fn create_test_account() -> AccountDBResponse {
        let now = Utc::now();
        AccountDBResponse {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            username: "test".to_string(),
            first_name: "Test".to_string(),
            last_name: "Account".to_string(),
            phone_number: None,
            password_hash: "hash".to_string(),
            role: AccountRole::Regular,
            capabilities: vec![],
            token_generation: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_and_verify_tokens() {
        let config = create_test_config();
        let account = create_test_account();

        let access = create_token(&account, TokenType::Access, &config).unwrap();
        let claims = verify_token(&access, TokenType::Access, &config).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.generation, 3);
        assert_eq!(claims.typ, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);

        let refresh = create_token(&account, TokenType::Refresh, &config).unwrap();
        let claims = verify_token(&refresh, TokenType::Refresh, &config).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let config = create_test_config();
        let account = create_test_account();

        let a = create_token(&account, TokenType::Access, &config).unwrap();
        let b = create_token(&account, TokenType::Access, &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let config = create_test_config();
        let account = create_test_account();

        let access = create_token(&account, TokenType::Access, &config).unwrap();
        let result = verify_token(&access, TokenType::Refresh, &config);
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));

        let refresh = create_token(&account, TokenType::Refresh, &config).unwrap();
        let result = verify_token(&refresh, TokenType::Access, &config);
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[test]
    fn test_verify_invalid_token() {
        let config = create_test_config();
        let result = verify_token("invalid.token.here", TokenType::Access, &config);
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let mut config = create_test_config();
        let account = create_test_account();

        let token = create_token(&account, TokenType::Access, &config).unwrap();

        config.secret_key = Some("different-secret".to_string());
        let result = verify_token(&token, TokenType::Access, &config);
        // Should be Unauthenticated (InvalidSignature), not Internal error
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        let account = create_test_account();

        let now = Utc::now();
        let claims = TokenClaims {
            sub: account.id,
            generation: 0,
            typ: TokenType::Access,
            iat: (now - chrono::Duration::hours(2)).timestamp(),
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode_claims(&claims, &config).unwrap();

        let result = verify_token(&token, TokenType::Access, &config);
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let config = Config::default();
        let account = create_test_account();

        let result = create_token(&account, TokenType::Access, &config);
        assert!(matches!(result, Err(Error::Internal { .. })));
    }
}
