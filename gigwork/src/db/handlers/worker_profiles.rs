//! Database repository for worker profiles.

use crate::types::{abbrev_uuid, AccountId, WorkerProfileId};
use crate::{
    api::models::workers::{AvailabilityStatus, ServiceCategory},
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::worker_profiles::{
            default_service_radius, VerificationChange, WorkerProfileCreateDBRequest, WorkerProfileDBResponse,
            WorkerProfileUpdateDBRequest,
        },
    },
    verification::status::VerificationStatus,
};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing worker profiles
#[derive(Debug, Clone)]
pub struct WorkerProfileFilter {
    pub skip: i64,
    pub limit: i64,
    pub verification_status: Option<VerificationStatus>,
    pub availability_status: Option<AvailabilityStatus>,
    pub service_category: Option<ServiceCategory>,
}

impl WorkerProfileFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            verification_status: None,
            availability_status: None,
            service_category: None,
        }
    }
}

pub struct WorkerProfiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> WorkerProfiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&account_id)), err)]
    pub async fn get_by_account(&mut self, account_id: AccountId) -> Result<Option<WorkerProfileDBResponse>> {
        let profile = sqlx::query_as::<_, WorkerProfileDBResponse>("SELECT * FROM worker_profiles WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    /// Lock the worker profile row for the rest of the transaction. Every change to a
    /// profile's verification state goes through this lock.
    #[instrument(skip(self), fields(worker_profile_id = %abbrev_uuid(&id)), err)]
    pub async fn lock_for_update(&mut self, id: WorkerProfileId) -> Result<Option<WorkerProfileDBResponse>> {
        let profile = sqlx::query_as::<_, WorkerProfileDBResponse>("SELECT * FROM worker_profiles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    #[instrument(skip(self, change), fields(worker_profile_id = %abbrev_uuid(&id), status = %change.status), err)]
    pub async fn set_verification(&mut self, id: WorkerProfileId, change: &VerificationChange) -> Result<WorkerProfileDBResponse> {
        let profile = sqlx::query_as::<_, WorkerProfileDBResponse>(
            r#"
            UPDATE worker_profiles SET
                verification_status = $2,
                verified_at = $3,
                verified_by = $4,
                rejection_reason = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.status)
        .bind(change.verified_at)
        .bind(change.verified_by)
        .bind(&change.rejection_reason)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(profile)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for WorkerProfiles<'c> {
    type CreateRequest = WorkerProfileCreateDBRequest;
    type UpdateRequest = WorkerProfileUpdateDBRequest;
    type Response = WorkerProfileDBResponse;
    type Id = WorkerProfileId;
    type Filter = WorkerProfileFilter;

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&request.account_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, WorkerProfileDBResponse>(
            r#"
            INSERT INTO worker_profiles (
                id, account_id, service_category, skills, bio, hourly_rate,
                service_latitude, service_longitude, service_radius_km
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.account_id)
        .bind(request.service_category)
        .bind(&request.skills)
        .bind(&request.bio)
        .bind(request.hourly_rate)
        .bind(request.service_latitude)
        .bind(request.service_longitude)
        .bind(request.service_radius_km.unwrap_or_else(default_service_radius))
        .fetch_one(&mut *self.db)
        .await?;
        Ok(profile)
    }

    #[instrument(skip(self), fields(worker_profile_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let profile = sqlx::query_as::<_, WorkerProfileDBResponse>("SELECT * FROM worker_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let profiles = sqlx::query_as::<_, WorkerProfileDBResponse>(
            r#"
            SELECT * FROM worker_profiles
            WHERE ($1::verification_status IS NULL OR verification_status = $1)
              AND ($2::availability_status IS NULL OR availability_status = $2)
              AND ($3::service_category IS NULL OR service_category = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.verification_status)
        .bind(filter.availability_status)
        .bind(filter.service_category)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(profiles)
    }

    #[instrument(skip(self), fields(worker_profile_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM worker_profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(worker_profile_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, WorkerProfileDBResponse>(
            r#"
            UPDATE worker_profiles SET
                service_category = COALESCE($2, service_category),
                skills = COALESCE($3, skills),
                bio = COALESCE($4, bio),
                hourly_rate = COALESCE($5, hourly_rate),
                service_latitude = COALESCE($6, service_latitude),
                service_longitude = COALESCE($7, service_longitude),
                service_radius_km = COALESCE($8, service_radius_km),
                availability_status = COALESCE($9, availability_status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.service_category)
        .bind(&request.skills)
        .bind(&request.bio)
        .bind(request.hourly_rate)
        .bind(request.service_latitude)
        .bind(request.service_longitude)
        .bind(request.service_radius_km)
        .bind(request.availability_status)
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
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    async fn create_account(conn: &mut PgConnection, username: &str) -> AccountId {
        Accounts::new(conn)
            .create(&AccountCreateDBRequest {
                email: format!("{username}@example.com"),
                username: username.to_string(),
                first_name: "Test".to_string(),
                last_name: "Worker".to_string(),
                phone_number: None,
                password_hash: "x".to_string(),
                role: AccountRole::Regular,
                capabilities: vec![],
            })
            .await
            .unwrap()
            .id
    }

    fn plumber(account_id: AccountId) -> WorkerProfileCreateDBRequest {
        WorkerProfileCreateDBRequest {
            account_id,
            service_category: ServiceCategory::Plumber,
            skills: Some("pipes".to_string()),
            bio: None,
            hourly_rate: Some(Decimal::new(2500, 2)),
            service_latitude: None,
            service_longitude: None,
            service_radius_km: None,
        }
    }

    #[sqlx::test]
    async fn test_create_defaults(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let account_id = create_account(&mut conn, "ram").await;

        let mut repo = WorkerProfiles::new(&mut conn);
        let profile = repo.create(&plumber(account_id)).await.unwrap();
        assert_eq!(profile.verification_status, VerificationStatus::Unverified);
        assert_eq!(profile.availability_status, AvailabilityStatus::Inactive);
        assert_eq!(profile.service_radius_km, default_service_radius());
        assert_eq!(profile.total_reviews, 0);

        let err = repo.create(&plumber(account_id)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(ref v) if v.constraint.as_deref() == Some("worker_profiles_account_unique")));

        assert_eq!(repo.get_by_account(account_id).await.unwrap().unwrap().id, profile.id);
    }

    #[sqlx::test]
    async fn test_set_verification_and_filter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let worker = create_account(&mut conn, "shyam").await;
        let reviewer = create_account(&mut conn, "reviewer").await;

        let mut repo = WorkerProfiles::new(&mut conn);
        let profile = repo.create(&plumber(worker)).await.unwrap();

        let change = VerificationChange::to(&profile, VerificationStatus::Approved, Some(reviewer), None);
        let approved = repo.set_verification(profile.id, &change).await.unwrap();
        assert_eq!(approved.verification_status, VerificationStatus::Approved);
        assert_eq!(approved.verified_by, Some(reviewer));
        assert!(approved.verified_at.is_some());

        let mut filter = WorkerProfileFilter::new(0, 10);
        filter.verification_status = Some(VerificationStatus::Approved);
        assert_eq!(repo.list(&filter).await.unwrap().len(), 1);
        filter.verification_status = Some(VerificationStatus::Pending);
        assert!(repo.list(&filter).await.unwrap().is_empty());
    }
}
