use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    #[validate(range(min = 1))]
    pub amount: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BankDetailsRequest {
    #[validate(length(min = 3, max = 10))]
    pub bank_code: String,

    #[validate(length(equal = 10, message = "account number must be 10 digits"))]
    pub account_number: String,

    #[validate(length(min = 2, max = 100))]
    pub account_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResponse {
    pub id: Uuid,
    pub amount: i64,
    pub fee: i64,
    pub payout: i64,
    pub status: String,
    pub requested_at: OffsetDateTime,
}

impl From<entity::withdrawal_requests::Model> for WithdrawalResponse {
    fn from(m: entity::withdrawal_requests::Model) -> Self {
        Self {
            id: m.id,
            amount: m.amount,
            fee: m.fee,
            payout: m.payout,
            status: m.status,
            requested_at: m.requested_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub total_earnings: i64,
    pub recent_transactions: Vec<LedgerEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub tx_ref: String,
    pub purpose: String,
    pub amount: i64,
    pub creator_share: i64,
    pub created_at: OffsetDateTime,
}

impl From<entity::transactions::Model> for LedgerEntry {
    fn from(m: entity::transactions::Model) -> Self {
        Self {
            tx_ref: m.tx_ref,
            purpose: m.purpose,
            amount: m.amount,
            creator_share: m.creator_share,
            created_at: m.created_at,
        }
    }
}
