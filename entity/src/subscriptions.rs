use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An entitlement: subscriber access to a creator's content until
/// `expires_at`. Status is active | expired | cancelled. At most one
/// active row per (subscriber, creator) is maintained by the grant
/// transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub creator_id: Uuid,
    pub bundle_id: Uuid,
    pub subscribed_at: TimeDateTimeWithTimeZone,
    pub expires_at: TimeDateTimeWithTimeZone,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
