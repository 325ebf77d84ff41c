use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only ledger row, one per settled tx_ref. Revenue split
/// columns always sum to `amount`. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub tx_ref: String,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub bundle_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub purpose: String,
    pub amount: i64,
    pub creator_share: i64,
    pub platform_share: i64,
    pub referrer_share: i64,
    pub referrer_id: Option<Uuid>,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
