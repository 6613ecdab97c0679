use crate::types::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default preferred search radius in km
pub fn default_preferred_radius() -> Decimal {
    Decimal::new(500, 2)
}

/// Database request for creating the profile that accompanies every account
#[derive(Debug, Clone)]
pub struct ProfileCreateDBRequest {
    pub account_id: AccountId,
}

/// Database request for updating a profile. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateDBRequest {
    pub current_latitude: Option<Decimal>,
    pub current_longitude: Option<Decimal>,
    pub current_address: Option<String>,
    pub preferred_radius_km: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileDBResponse {
    pub account_id: AccountId,
    pub current_latitude: Option<Decimal>,
    pub current_longitude: Option<Decimal>,
    pub current_address: Option<String>,
    pub preferred_radius_km: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
