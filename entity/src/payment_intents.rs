use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A provisional payment: created when a payment link is issued,
/// resolved exactly once by verification. `tx_ref` is the idempotency
/// key for the whole payment flow and carries a unique constraint.
/// Status is pending | completed | failed | cancelled.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_intents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub tx_ref: String,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub bundle_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub amount: i64,
    pub purpose: String,
    pub status: String,
    pub tip_message: Option<String>,
    pub provider_tx_id: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
