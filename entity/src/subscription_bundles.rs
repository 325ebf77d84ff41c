use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Creator-defined subscription tier. `duration` is one of
/// day | month | three_months | six_months | year; `duration_weight`
/// is derived from it at insert time for sort ordering.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_bundles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub price: i64,
    pub duration: String,
    pub is_free: bool,
    pub duration_weight: i32,
    pub discount_percent: Option<i32>,
    pub discount_expires_at: Option<TimeDateTimeWithTimeZone>,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
