use crate::db::models::profiles::ProfileDBResponse;
use crate::types::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub account_id: AccountId,
    #[schema(value_type = Option<String>)]
    pub current_latitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub current_longitude: Option<Decimal>,
    pub current_address: Option<String>,
    #[schema(value_type = String, example = "5.00")]
    pub preferred_radius_km: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            account_id: db.account_id,
            current_latitude: db.current_latitude,
            current_longitude: db.current_longitude,
            current_address: db.current_address,
            preferred_radius_km: db.preferred_radius_km,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[schema(value_type = Option<String>)]
    pub current_latitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub current_longitude: Option<Decimal>,
    pub current_address: Option<String>,
    /// Between 0.2 and 20 km
    #[schema(value_type = Option<String>)]
    pub preferred_radius_km: Option<Decimal>,
}
