use crate::api::models::accounts::{AccountRole, Capability};
use crate::types::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a new account
#[derive(Debug, Clone)]
pub struct AccountCreateDBRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: AccountRole,
    pub capabilities: Vec<Capability>,
}

/// Database request for updating an account
#[derive(Debug, Clone, Default)]
pub struct AccountUpdateDBRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
    pub capabilities: Option<Vec<Capability>>,
}

/// Database response for an account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountDBResponse {
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: AccountRole,
    pub capabilities: Vec<Capability>,
    /// Embedded in every issued token; bumping it revokes all of them
    pub token_generation: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
