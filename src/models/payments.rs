use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to start a paid subscription
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub creator_id: Uuid,
    pub bundle_id: Uuid,
}

/// Request to join a creator's free bundle
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeFreeRequest {
    pub creator_id: Uuid,
    pub bundle_id: Uuid,
}

/// Request to unlock a pay-per-view post
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnlockSpecialRequest {
    pub post_id: Uuid,
}

/// Request to tip a creator, optionally with a chat message
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TipRequest {
    #[validate(range(min = 100, message = "minimum tip is 100"))]
    pub amount: i64,

    #[validate(length(max = 500))]
    pub message: Option<String>,
}

/// Payment link handed back to the client for redirect
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkResponse {
    pub payment_link: String,
    pub tx_ref: String,
}

/// Query parameters the provider appends to the redirect-back URL
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub tx_ref: String,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
}

/// Terminal state of a verification attempt
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Granted,
    AlreadyGranted,
    Cancelled,
    Failed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub status: VerificationStatus,
    pub tx_ref: String,
}

/// Provider webhook payload. Only `charge.success` is handled.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookCharge,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCharge {
    pub id: u64,
    pub tx_ref: String,
}

/// Post as seen by a requesting user. `media_url` is a signed URL and
/// only present when the user is entitled to the full media.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub caption: String,
    pub is_special: bool,
    pub unlock_price: Option<i64>,
    pub has_access: bool,
    pub media_url: Option<String>,
    pub preview_url: Option<String>,
}
