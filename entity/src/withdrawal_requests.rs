use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Creator payout request. The requested amount is deducted from the
/// balance up front; a failed bank transfer refunds it. Status is
/// pending | completed | failed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawal_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub fee: i64,
    pub payout: i64,
    pub status: String,
    pub failure_reason: Option<String>,
    pub requested_at: TimeDateTimeWithTimeZone,
    pub processed_at: Option<TimeDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
