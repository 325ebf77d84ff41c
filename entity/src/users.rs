use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Platform account. Creators additionally carry an earnings balance
/// (integer NGN, never negative) and optional bank payout details.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub is_creator: bool,
    pub creator_since: Option<TimeDateTimeWithTimeZone>,
    pub referrer_id: Option<Uuid>,
    pub total_earnings: i64,
    pub bank_code: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_account_name: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
