use super::pagination::Pagination;
use crate::db::models::worker_profiles::WorkerProfileDBResponse;
use crate::types::{AccountId, WorkerProfileId};
use crate::verification::status::VerificationStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "service_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Plumber,
    Electrician,
    Cleaner,
    Carpenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "availability_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Active,
    Inactive,
    Busy,
}

/// Request body for promoting the current account to a worker
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BecomeWorkerRequest {
    pub service_category: ServiceCategory,
    pub skills: Option<String>,
    /// At most 500 characters
    pub bio: Option<String>,
    #[schema(value_type = Option<String>, example = "25.00")]
    pub hourly_rate: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_latitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_longitude: Option<Decimal>,
    /// Defaults to 10 km
    #[schema(value_type = Option<String>)]
    pub service_radius_km: Option<Decimal>,
}

/// Partial update of the descriptive worker fields. Verification fields are never writable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct WorkerProfileUpdate {
    pub service_category: Option<ServiceCategory>,
    pub skills: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Option<String>)]
    pub hourly_rate: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_latitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_longitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_radius_km: Option<Decimal>,
    pub availability_status: Option<AvailabilityStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkerProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: WorkerProfileId,
    #[schema(value_type = String, format = "uuid")]
    pub account_id: AccountId,
    pub verification_status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub verified_by: Option<AccountId>,
    pub rejection_reason: Option<String>,
    pub availability_status: AvailabilityStatus,
    pub service_category: ServiceCategory,
    pub skills: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Option<String>)]
    pub hourly_rate: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_latitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub service_longitude: Option<Decimal>,
    #[schema(value_type = String)]
    pub service_radius_km: Decimal,
    #[schema(value_type = String)]
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub total_jobs_completed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkerProfileDBResponse> for WorkerProfileResponse {
    fn from(db: WorkerProfileDBResponse) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            verification_status: db.verification_status,
            verified_at: db.verified_at,
            verified_by: db.verified_by,
            rejection_reason: db.rejection_reason,
            availability_status: db.availability_status,
            service_category: db.service_category,
            skills: db.skills,
            bio: db.bio,
            hourly_rate: db.hourly_rate,
            service_latitude: db.service_latitude,
            service_longitude: db.service_longitude,
            service_radius_km: db.service_radius_km,
            average_rating: db.average_rating,
            total_reviews: db.total_reviews,
            total_jobs_completed: db.total_jobs_completed,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing worker profiles
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListWorkersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    pub verification_status: Option<VerificationStatus>,
    pub availability_status: Option<AvailabilityStatus>,
    pub service_category: Option<ServiceCategory>,
}
