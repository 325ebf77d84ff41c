use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Creator media post. Special posts carry an `unlock_price` and are
/// gated behind a one-time purchase independent of subscription.
/// `media_key` / `preview_key` are object-storage keys, resolved to
/// signed URLs on access.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub creator_id: Uuid,
    pub caption: String,
    pub media_key: String,
    pub preview_key: Option<String>,
    pub is_special: bool,
    pub unlock_price: Option<i64>,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
