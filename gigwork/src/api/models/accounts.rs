use super::pagination::Pagination;
use crate::db::models::accounts::AccountDBResponse;
use crate::types::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// What an account does on the platform. Only ever moves from REGULAR to WORKER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "account_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    Regular,
    Worker,
}

/// Administrative capabilities, granted independently of the role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "capability", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Admin,
    VerifyWorkers,
    ManageUsers,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Admin, Capability::VerifyWorkers, Capability::ManageUsers];
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: AccountRole,
    pub capabilities: Vec<Capability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountDBResponse> for AccountResponse {
    fn from(db: AccountDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            phone_number: db.phone_number,
            role: db.role,
            capabilities: db.capabilities,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing accounts
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListAccountsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    /// Only accounts with this role
    pub role: Option<AccountRole>,
    /// Case-insensitive substring match on email, username or phone number
    pub search: Option<String>,
}

/// The authenticated account behind a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentAccount {
    #[schema(value_type = String, format = "uuid")]
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub role: AccountRole,
    pub capabilities: Vec<Capability>,
}

impl CurrentAccount {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_admin(&self) -> bool {
        self.has_capability(Capability::Admin)
    }
}

impl From<&AccountDBResponse> for CurrentAccount {
    fn from(db: &AccountDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
            username: db.username.clone(),
            role: db.role,
            capabilities: db.capabilities.clone(),
        }
    }
}
