//! Database repository for accounts.

use crate::types::{abbrev_uuid, AccountId};
use crate::{
    api::models::accounts::AccountRole,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
    },
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing accounts
#[derive(Debug, Clone)]
pub struct AccountFilter {
    pub skip: i64,
    pub limit: i64,
    pub role: Option<AccountRole>,
    /// Case-insensitive substring match on email, username or phone number
    pub search: Option<String>,
}

impl AccountFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            role: None,
            search: None,
        }
    }

    pub fn with_role(mut self, role: AccountRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Wrap a search term for `ILIKE ... ESCAPE '\'` so wildcards in it match literally
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub struct Accounts<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Accounts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<AccountDBResponse>> {
        let account = sqlx::query_as::<_, AccountDBResponse>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(account)
    }

    #[instrument(skip(self), err)]
    pub async fn username_exists(&mut self, username: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
            .bind(username)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    /// Lock the account row for the rest of the transaction
    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_for_update(&mut self, id: AccountId) -> Result<Option<AccountDBResponse>> {
        let account = sqlx::query_as::<_, AccountDBResponse>("SELECT * FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(account)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    pub async fn set_role(&mut self, id: AccountId, role: AccountRole) -> Result<AccountDBResponse> {
        let account = sqlx::query_as::<_, AccountDBResponse>(
            "UPDATE accounts SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(account)
    }

    /// Increment the token generation, invalidating every token issued so far. Returns the new value.
    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    pub async fn bump_token_generation(&mut self, id: AccountId) -> Result<i32> {
        let generation: Option<i32> = sqlx::query_scalar(
            "UPDATE accounts SET token_generation = token_generation + 1, updated_at = NOW() WHERE id = $1 RETURNING token_generation",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        generation.ok_or(DbError::NotFound)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Accounts<'c> {
    type CreateRequest = AccountCreateDBRequest;
    type UpdateRequest = AccountUpdateDBRequest;
    type Response = AccountDBResponse;
    type Id = AccountId;
    type Filter = AccountFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let account = sqlx::query_as::<_, AccountDBResponse>(
            r#"
            INSERT INTO accounts (id, email, username, first_name, last_name, phone_number, password_hash, role, capabilities)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.username)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.phone_number)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(&request.capabilities)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(account)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let account = sqlx::query_as::<_, AccountDBResponse>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(account)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let pattern = filter.search.as_deref().map(contains_pattern);
        let accounts = sqlx::query_as::<_, AccountDBResponse>(
            r#"
            SELECT * FROM accounts
            WHERE ($1::account_role IS NULL OR role = $1)
              AND ($2::text IS NULL
                   OR email ILIKE $2 ESCAPE '\' OR username ILIKE $2 ESCAPE '\'
                   OR phone_number ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.role)
        .bind(pattern)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(accounts)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let account = sqlx::query_as::<_, AccountDBResponse>(
            r#"
            UPDATE accounts SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                password_hash = COALESCE($4, password_hash),
                capabilities = COALESCE($5, capabilities),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.password_hash)
        .bind(&request.capabilities)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(account)
    }
}
