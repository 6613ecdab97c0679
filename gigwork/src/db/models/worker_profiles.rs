use crate::api::models::workers::{AvailabilityStatus, ServiceCategory};
use crate::types::{AccountId, WorkerProfileId};
use crate::verification::status::VerificationStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default service radius in km
pub fn default_service_radius() -> Decimal {
    Decimal::new(1000, 2)
}

/// Database request for creating a worker profile. New profiles always start UNVERIFIED.
#[derive(Debug, Clone)]
pub struct WorkerProfileCreateDBRequest {
    pub account_id: AccountId,
    pub service_category: ServiceCategory,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub service_latitude: Option<Decimal>,
    pub service_longitude: Option<Decimal>,
    pub service_radius_km: Option<Decimal>,
}

/// Database request for updating the descriptive fields of a worker profile
#[derive(Debug, Clone, Default)]
pub struct WorkerProfileUpdateDBRequest {
    pub service_category: Option<ServiceCategory>,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub service_latitude: Option<Decimal>,
    pub service_longitude: Option<Decimal>,
    pub service_radius_km: Option<Decimal>,
    pub availability_status: Option<AvailabilityStatus>,
}

/// New verification state, written only by the workflow
#[derive(Debug, Clone)]
pub struct VerificationChange {
    pub status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<AccountId>,
    pub rejection_reason: Option<String>,
}

impl VerificationChange {
    /// Describe the move of `profile` to `next`, recording the reviewer on approval and the
    /// reviewer's note on rejection.
    pub fn to(profile: &WorkerProfileDBResponse, next: VerificationStatus, reviewer: Option<AccountId>, note: Option<&str>) -> Self {
        match next {
            VerificationStatus::Approved => Self {
                status: next,
                verified_at: Some(Utc::now()),
                verified_by: reviewer,
                rejection_reason: None,
            },
            VerificationStatus::Rejected => Self {
                status: next,
                verified_at: None,
                verified_by: None,
                rejection_reason: note.map(str::to_string).or_else(|| profile.rejection_reason.clone()),
            },
            VerificationStatus::Pending | VerificationStatus::Unverified => Self {
                status: next,
                verified_at: None,
                verified_by: None,
                rejection_reason: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkerProfileDBResponse {
    pub id: WorkerProfileId,
    pub account_id: AccountId,
    pub verification_status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<AccountId>,
    pub rejection_reason: Option<String>,
    pub availability_status: AvailabilityStatus,
    pub service_category: ServiceCategory,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub service_latitude: Option<Decimal>,
    pub service_longitude: Option<Decimal>,
    pub service_radius_km: Decimal,
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub total_jobs_completed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
