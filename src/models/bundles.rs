use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

/// Request to create a paid subscription bundle
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBundleRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    #[validate(range(min = 100, message = "minimum bundle price is 100"))]
    pub price: i64,

    /// One of: day, month, three_months, six_months, year
    pub duration: String,

    #[validate(range(min = 1, max = 90))]
    pub discount_percent: Option<i32>,

    pub discount_expires_at: Option<OffsetDateTime>,
}

/// Toggle between free-mode and paid-mode
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeModeRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResponse {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    pub duration: String,
    pub is_free: bool,
    pub discount_percent: Option<i32>,
    pub discount_expires_at: Option<OffsetDateTime>,
}

impl From<entity::subscription_bundles::Model> for BundleResponse {
    fn from(m: entity::subscription_bundles::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            price: m.price,
            duration: m.duration,
            is_free: m.is_free,
            discount_percent: m.discount_percent,
            discount_expires_at: m.discount_expires_at,
        }
    }
}
