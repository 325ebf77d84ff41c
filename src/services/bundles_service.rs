use crate::{
    error::{ApiError, Result},
    models::{
        bundles::CreateBundleRequest,
        common::{BundleDuration, SubscriptionStatus},
    },
};
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, TransactionTrait};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

/// Price of a bundle after any live discount. Discounts expire by
/// timestamp; an expired discount leaves the list price untouched.
pub fn effective_price(bundle: &entity::subscription_bundles::Model, now: OffsetDateTime) -> i64 {
    match (bundle.discount_percent, bundle.discount_expires_at) {
        (Some(pct), Some(expires)) if expires > now => {
            bundle.price - bundle.price * pct as i64 / 100
        }
        (Some(pct), None) => bundle.price - bundle.price * pct as i64 / 100,
        _ => bundle.price,
    }
}

pub struct BundlesService {
    db: DatabaseConnection,
}

impl BundlesService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a paid bundle. Rejected while the creator is in free
    /// mode; the two catalog modes are mutually exclusive.
    #[instrument(skip(self, request))]
    pub async fn create_bundle(
        &self,
        creator_id: Uuid,
        request: CreateBundleRequest,
    ) -> Result<entity::subscription_bundles::Model> {
        let duration = BundleDuration::from_str(&request.duration).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown duration '{}'", request.duration))
        })?;

        let free_bundle = entity::subscription_bundles::Entity::find()
            .filter(entity::subscription_bundles::Column::CreatorId.eq(creator_id))
            .filter(entity::subscription_bundles::Column::IsFree.eq(true))
            .one(&self.db)
            .await?;
        if free_bundle.is_some() {
            return Err(ApiError::Conflict(
                "Disable free mode before creating paid bundles".to_string(),
            ));
        }

        let bundle = entity::subscription_bundles::ActiveModel {
            id: Set(Uuid::new_v4()),
            creator_id: Set(creator_id),
            title: Set(request.title),
            price: Set(request.price),
            duration: Set(duration.as_str().to_string()),
            is_free: Set(false),
            duration_weight: Set(duration.weight()),
            discount_percent: Set(request.discount_percent),
            discount_expires_at: Set(request.discount_expires_at),
            created_at: Set(OffsetDateTime::now_utc()),
        };

        Ok(bundle.insert(&self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_bundle(&self, creator_id: Uuid, bundle_id: Uuid) -> Result<()> {
        let bundle = entity::subscription_bundles::Entity::find_by_id(bundle_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Bundle not found".to_string()))?;

        if bundle.creator_id != creator_id {
            return Err(ApiError::Unauthorized(
                "Bundle belongs to another creator".to_string(),
            ));
        }

        entity::subscription_bundles::Entity::delete_by_id(bundle_id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Bundles for a creator, shortest duration first.
    #[instrument(skip(self))]
    pub async fn list_bundles(
        &self,
        creator_id: Uuid,
    ) -> Result<Vec<entity::subscription_bundles::Model>> {
        let bundles = entity::subscription_bundles::Entity::find()
            .filter(entity::subscription_bundles::Column::CreatorId.eq(creator_id))
            .order_by_asc(entity::subscription_bundles::Column::DurationWeight)
            .all(&self.db)
            .await?;

        Ok(bundles)
    }

    /// Flip the creator's catalog between free-mode and paid-mode.
    /// Enabling deletes every paid bundle and installs the single free
    /// bundle; disabling deletes it, expires its subscriptions, and
    /// clears affected subscribers' bookmarks on this creator's posts.
    #[instrument(skip(self))]
    pub async fn set_free_mode(&self, creator_id: Uuid, enabled: bool) -> Result<()> {
        if enabled {
            self.enable_free_mode(creator_id).await
        } else {
            self.disable_free_mode(creator_id).await
        }
    }

    async fn enable_free_mode(&self, creator_id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;

        let existing_free = entity::subscription_bundles::Entity::find()
            .filter(entity::subscription_bundles::Column::CreatorId.eq(creator_id))
            .filter(entity::subscription_bundles::Column::IsFree.eq(true))
            .one(&txn)
            .await?;
        if existing_free.is_some() {
            txn.rollback().await?;
            return Ok(());
        }

        entity::subscription_bundles::Entity::delete_many()
            .filter(entity::subscription_bundles::Column::CreatorId.eq(creator_id))
            .exec(&txn)
            .await?;

        let free_bundle = entity::subscription_bundles::ActiveModel {
            id: Set(Uuid::new_v4()),
            creator_id: Set(creator_id),
            title: Set("Free access".to_string()),
            price: Set(0),
            duration: Set(BundleDuration::Month.as_str().to_string()),
            is_free: Set(true),
            duration_weight: Set(BundleDuration::Month.weight()),
            discount_percent: Set(None),
            discount_expires_at: Set(None),
            created_at: Set(OffsetDateTime::now_utc()),
        };
        free_bundle.insert(&txn).await?;

        txn.commit().await?;

        info!("Creator {} switched to free mode", creator_id);

        Ok(())
    }

    async fn disable_free_mode(&self, creator_id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;

        let free_bundle = entity::subscription_bundles::Entity::find()
            .filter(entity::subscription_bundles::Column::CreatorId.eq(creator_id))
            .filter(entity::subscription_bundles::Column::IsFree.eq(true))
            .one(&txn)
            .await?;

        let Some(free_bundle) = free_bundle else {
            txn.rollback().await?;
            return Ok(());
        };

        let affected = entity::subscriptions::Entity::find()
            .filter(entity::subscriptions::Column::BundleId.eq(free_bundle.id))
            .filter(entity::subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .all(&txn)
            .await?;
        let affected_ids: Vec<Uuid> = affected.iter().map(|s| s.subscriber_id).collect();

        entity::subscriptions::Entity::update_many()
            .col_expr(
                entity::subscriptions::Column::Status,
                Expr::value(SubscriptionStatus::Expired.as_str()),
            )
            .filter(entity::subscriptions::Column::BundleId.eq(free_bundle.id))
            .filter(entity::subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .exec(&txn)
            .await?;

        if !affected_ids.is_empty() {
            let creator_posts: Vec<Uuid> = entity::posts::Entity::find()
                .filter(entity::posts::Column::CreatorId.eq(creator_id))
                .all(&txn)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();

            if !creator_posts.is_empty() {
                entity::bookmarks::Entity::delete_many()
                    .filter(entity::bookmarks::Column::UserId.is_in(affected_ids.clone()))
                    .filter(entity::bookmarks::Column::PostId.is_in(creator_posts))
                    .exec(&txn)
                    .await?;
            }
        }

        entity::subscription_bundles::Entity::delete_by_id(free_bundle.id)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            "Creator {} left free mode; {} subscriptions expired",
            creator_id,
            affected_ids.len()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn bundle(
        price: i64,
        discount_percent: Option<i32>,
        discount_expires_at: Option<OffsetDateTime>,
    ) -> entity::subscription_bundles::Model {
        entity::subscription_bundles::Model {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Monthly".to_string(),
            price,
            duration: "month".to_string(),
            is_free: false,
            duration_weight: 2,
            discount_percent,
            discount_expires_at,
            created_at: datetime!(2026-01-01 00:00 UTC),
        }
    }

    #[test]
    fn list_price_without_discount() {
        let now = datetime!(2026-02-01 00:00 UTC);
        assert_eq!(effective_price(&bundle(1000, None, None), now), 1000);
    }

    #[test]
    fn live_discount_is_applied() {
        let now = datetime!(2026-02-01 00:00 UTC);
        let b = bundle(1000, Some(20), Some(datetime!(2026-03-01 00:00 UTC)));
        assert_eq!(effective_price(&b, now), 800);
    }

    #[test]
    fn expired_discount_is_ignored() {
        let now = datetime!(2026-02-01 00:00 UTC);
        let b = bundle(1000, Some(20), Some(datetime!(2026-01-15 00:00 UTC)));
        assert_eq!(effective_price(&b, now), 1000);
    }

    #[test]
    fn open_ended_discount_applies() {
        let now = datetime!(2026-02-01 00:00 UTC);
        let b = bundle(500, Some(10), None);
        assert_eq!(effective_price(&b, now), 450);
    }
}
