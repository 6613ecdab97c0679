//! Database repository for account profiles.

use crate::types::{abbrev_uuid, AccountId};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest},
};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing profiles
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    pub skip: i64,
    pub limit: i64,
}

impl ProfileFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Profiles<'c> {
    type CreateRequest = ProfileCreateDBRequest;
    type UpdateRequest = ProfileUpdateDBRequest;
    type Response = ProfileDBResponse;
    type Id = AccountId;
    type Filter = ProfileFilter;

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&request.account_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("INSERT INTO profiles (account_id) VALUES ($1) RETURNING *")
            .bind(request.account_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(profile)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE account_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let profiles = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(profiles)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE account_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            UPDATE profiles SET
                current_latitude = COALESCE($2, current_latitude),
                current_longitude = COALESCE($3, current_longitude),
                current_address = COALESCE($4, current_address),
                preferred_radius_km = COALESCE($5, preferred_radius_km),
                updated_at = NOW()
            WHERE account_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.current_latitude)
        .bind(request.current_longitude)
        .bind(&request.current_address)
        .bind(request.preferred_radius_km)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::accounts::AccountRole;
    use crate::db::handlers::Accounts;
    use crate::db::models::accounts::AccountCreateDBRequest;
    use crate::db::models::profiles::default_preferred_radius;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_profile_defaults_and_partial_update(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let account = Accounts::new(&mut conn)
            .create(&AccountCreateDBRequest {
                email: "maya@example.com".to_string(),
                username: "maya".to_string(),
                first_name: "Maya".to_string(),
                last_name: "Rai".to_string(),
                phone_number: None,
                password_hash: "x".to_string(),
                role: AccountRole::Regular,
                capabilities: vec![],
            })
            .await
            .unwrap();

        let mut repo = Profiles::new(&mut conn);
        let profile = repo.create(&ProfileCreateDBRequest { account_id: account.id }).await.unwrap();
        assert_eq!(profile.preferred_radius_km, default_preferred_radius());
        assert!(profile.current_address.is_none());

        let updated = repo
            .update(
                account.id,
                &ProfileUpdateDBRequest {
                    current_address: Some("Lalitpur".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.current_address.as_deref(), Some("Lalitpur"));
        assert_eq!(updated.preferred_radius_km, default_preferred_radius());

        // The CHECK constraint backs up application validation
        let err = repo
            .update(
                account.id,
                &ProfileUpdateDBRequest {
                    preferred_radius_km: Some(Decimal::new(50, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation(_)));
    }
}
