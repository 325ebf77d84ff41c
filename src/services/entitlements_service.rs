use crate::{
    error::{ApiError, Result},
    models::common::{BundleDuration, IntentStatus, PaymentPurpose, SubscriptionStatus},
    services::gateway_service::VerifiedCharge,
};
use anyhow::anyhow;
use sea_orm::{
    entity::*,
    query::*,
    sea_query::{Expr, OnConflict},
    DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

/// Creator keeps 75% of every settled payment.
pub const CREATOR_SHARE_PERCENT: i64 = 75;
/// Referrer takes 5% out of the platform's cut while the window is open.
pub const REFERRER_SHARE_PERCENT: i64 = 5;
/// Days after `creator_since` during which the referrer earns a share.
pub const REFERRAL_WINDOW_DAYS: i64 = 90;
/// Free bundles grant rolling 30-day subscriptions.
pub const FREE_SUBSCRIPTION_DAYS: i64 = 30;

/// Revenue split for one settled payment. Shares always sum to the
/// full amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueSplit {
    pub creator: i64,
    pub platform: i64,
    pub referrer: i64,
}

/// 75/25 normally, 75/20/5 when a referrer share applies. Integer
/// math with the platform taking the remainder keeps the sum exact.
pub fn split_revenue(amount: i64, with_referrer: bool) -> RevenueSplit {
    let creator = amount * CREATOR_SHARE_PERCENT / 100;
    let referrer = if with_referrer {
        amount * REFERRER_SHARE_PERCENT / 100
    } else {
        0
    };
    let platform = amount - creator - referrer;

    RevenueSplit {
        creator,
        platform,
        referrer,
    }
}

/// Whether `now` still falls inside the referral window opened at
/// `creator_since`.
pub fn within_referral_window(creator_since: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match creator_since {
        Some(since) => now < since + time::Duration::days(REFERRAL_WINDOW_DAYS),
        None => false,
    }
}

/// Expiry for a subscription granted at `now`.
pub fn subscription_expiry(now: OffsetDateTime, duration: BundleDuration) -> OffsetDateTime {
    now + duration.offset()
}

/// Result of a grant attempt. A duplicate callback for an already
/// settled tx_ref resolves to `AlreadyGranted` with no state change.
#[derive(Debug, Clone)]
pub enum GrantOutcome {
    Granted(GrantedPayment),
    AlreadyGranted,
}

#[derive(Debug, Clone)]
pub struct GrantedPayment {
    pub tx_ref: String,
    pub purpose: PaymentPurpose,
    pub payer_id: Uuid,
    pub creator_id: Uuid,
    pub amount: i64,
    pub tip_message: Option<String>,
}

pub struct EntitlementsService {
    db: DatabaseConnection,
}

impl EntitlementsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Settle a verified payment: mutate exactly one entitlement,
    /// append exactly one ledger row, and credit earnings, all inside
    /// one database transaction keyed by tx_ref.
    ///
    /// The intent row is locked for the duration, so concurrent
    /// verification callbacks serialize; whichever loses the race sees
    /// a non-pending status and returns `AlreadyGranted`.
    #[instrument(skip(self, verified))]
    pub async fn grant(
        &self,
        tx_ref: &str,
        verified: &VerifiedCharge,
        provider_tx_id: Option<&str>,
    ) -> Result<GrantOutcome> {
        let txn = self.db.begin().await?;
        let now = OffsetDateTime::now_utc();

        let intent = entity::payment_intents::Entity::find()
            .filter(entity::payment_intents::Column::TxRef.eq(tx_ref))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No payment intent for {}", tx_ref)))?;

        match IntentStatus::from_str(&intent.status) {
            Some(IntentStatus::Pending) => {}
            Some(IntentStatus::Completed) => {
                txn.rollback().await?;
                info!("Duplicate verification for {} ignored", tx_ref);
                return Ok(GrantOutcome::AlreadyGranted);
            }
            Some(other) => {
                txn.rollback().await?;
                return Err(ApiError::Conflict(format!(
                    "Payment {} already resolved as {}",
                    tx_ref,
                    other.as_str()
                )));
            }
            None => {
                txn.rollback().await?;
                return Err(ApiError::Internal(anyhow!(
                    "Corrupt intent status '{}' for {}",
                    intent.status,
                    tx_ref
                )));
            }
        }

        let purpose = PaymentPurpose::from_str(&intent.purpose).ok_or_else(|| {
            ApiError::Internal(anyhow!(
                "Corrupt intent purpose '{}' for {}",
                intent.purpose,
                tx_ref
            ))
        })?;

        // Amount tampering check. The intent is marked failed so the
        // tx_ref can never settle later.
        if verified.amount != intent.amount {
            let detail = format!(
                "expected {} got {} for {}",
                intent.amount, verified.amount, tx_ref
            );
            let mut failed: entity::payment_intents::ActiveModel = intent.into();
            failed.status = Set(IntentStatus::Failed.as_str().to_string());
            failed.updated_at = Set(now);
            failed.update(&txn).await?;
            txn.commit().await?;
            return Err(ApiError::AmountMismatch(detail));
        }

        let creator = entity::users::Entity::find_by_id(intent.creator_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound("Creator no longer exists".to_string()))?;

        let referred =
            creator.referrer_id.is_some() && within_referral_window(creator.creator_since, now);
        let split = split_revenue(intent.amount, referred);
        let referrer_id = if referred { creator.referrer_id } else { None };

        // Ledger insert guarded by the unique tx_ref index. The
        // read-back confirms this transaction owns the row; losing
        // means another settlement already happened.
        let ledger_id = Uuid::new_v4();
        let ledger_row = entity::transactions::ActiveModel {
            id: Set(ledger_id),
            tx_ref: Set(intent.tx_ref.clone()),
            payer_id: Set(intent.payer_id),
            creator_id: Set(intent.creator_id),
            bundle_id: Set(intent.bundle_id),
            post_id: Set(intent.post_id),
            purpose: Set(intent.purpose.clone()),
            amount: Set(intent.amount),
            creator_share: Set(split.creator),
            platform_share: Set(split.platform),
            referrer_share: Set(split.referrer),
            referrer_id: Set(referrer_id),
            created_at: Set(now),
        };

        entity::transactions::Entity::insert(ledger_row)
            .on_conflict(
                OnConflict::column(entity::transactions::Column::TxRef)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&txn)
            .await?;

        let persisted = entity::transactions::Entity::find()
            .filter(entity::transactions::Column::TxRef.eq(intent.tx_ref.clone()))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(anyhow!("Failed to read ledger row after insert for {}", tx_ref))
            })?;

        if persisted.id != ledger_id {
            txn.rollback().await?;
            info!("Ledger row for {} already written by another settlement", tx_ref);
            return Ok(GrantOutcome::AlreadyGranted);
        }

        match purpose {
            PaymentPurpose::Subscription => {
                let bundle_id = intent.bundle_id.ok_or_else(|| {
                    ApiError::Internal(anyhow!("Subscription intent {} without bundle", tx_ref))
                })?;
                self.replace_active_subscription(
                    intent.payer_id,
                    intent.creator_id,
                    bundle_id,
                    now,
                    &txn,
                )
                .await?;
            }
            PaymentPurpose::Special => {
                let post_id = intent.post_id.ok_or_else(|| {
                    ApiError::Internal(anyhow!("Special intent {} without post", tx_ref))
                })?;
                let purchase = entity::purchased_content::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(intent.payer_id),
                    post_id: Set(post_id),
                    amount: Set(intent.amount),
                    tx_ref: Set(intent.tx_ref.clone()),
                    purchased_at: Set(now),
                };
                purchase.insert(&txn).await?;
            }
            PaymentPurpose::Tip => {
                // No entitlement row; the chat side effect runs after
                // commit, driven by the returned outcome.
            }
        }

        let mut creator_active: entity::users::ActiveModel = creator.into();
        let balance = *creator_active.total_earnings.as_ref();
        creator_active.total_earnings = Set(balance + split.creator);
        creator_active.update(&txn).await?;

        if let Some(referrer_id) = referrer_id {
            // The referrer row may have been deleted; the ledger still
            // records the share either way.
            if let Some(referrer) = entity::users::Entity::find_by_id(referrer_id)
                .lock_exclusive()
                .one(&txn)
                .await?
            {
                let mut referrer_active: entity::users::ActiveModel = referrer.into();
                let balance = *referrer_active.total_earnings.as_ref();
                referrer_active.total_earnings = Set(balance + split.referrer);
                referrer_active.update(&txn).await?;
            }
        }

        let mut intent_active: entity::payment_intents::ActiveModel = intent.clone().into();
        intent_active.status = Set(IntentStatus::Completed.as_str().to_string());
        intent_active.provider_tx_id = Set(provider_tx_id.map(|s| s.to_string()));
        intent_active.updated_at = Set(now);
        intent_active.update(&txn).await?;

        txn.commit().await?;

        info!(
            "Settled {}: purpose={}, amount={}, creator_share={}, referrer_share={}",
            tx_ref, intent.purpose, intent.amount, split.creator, split.referrer
        );

        Ok(GrantOutcome::Granted(GrantedPayment {
            tx_ref: intent.tx_ref,
            purpose,
            payer_id: intent.payer_id,
            creator_id: intent.creator_id,
            amount: intent.amount,
            tip_message: intent.tip_message,
        }))
    }

    /// Join a creator's free bundle directly, without a gateway round
    /// trip or ledger row.
    #[instrument(skip(self))]
    pub async fn grant_free_subscription(
        &self,
        subscriber_id: Uuid,
        creator_id: Uuid,
        bundle_id: Uuid,
    ) -> Result<entity::subscriptions::Model> {
        if subscriber_id == creator_id {
            return Err(ApiError::BadRequest(
                "You cannot subscribe to yourself".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let now = OffsetDateTime::now_utc();

        let bundle = entity::subscription_bundles::Entity::find_by_id(bundle_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound("Bundle not found".to_string()))?;

        if bundle.creator_id != creator_id {
            return Err(ApiError::BadRequest(
                "Bundle does not belong to this creator".to_string(),
            ));
        }
        if !bundle.is_free {
            return Err(ApiError::BadRequest(
                "Bundle is not free; use the paid subscribe flow".to_string(),
            ));
        }

        self.expire_active_subscriptions(subscriber_id, creator_id, &txn)
            .await?;

        let subscription = entity::subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            subscriber_id: Set(subscriber_id),
            creator_id: Set(creator_id),
            bundle_id: Set(bundle_id),
            subscribed_at: Set(now),
            expires_at: Set(now + time::Duration::days(FREE_SUBSCRIPTION_DAYS)),
            status: Set(SubscriptionStatus::Active.as_str().to_string()),
        };
        let model = subscription.insert(&txn).await?;

        txn.commit().await?;

        info!(
            "Granted free subscription: subscriber={}, creator={}",
            subscriber_id, creator_id
        );

        Ok(model)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<entity::posts::Model> {
        entity::posts::Entity::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }

    /// Whether the user may see the full media of a post. Owners
    /// always can; special posts need a purchase; regular posts need
    /// an unexpired active subscription to the creator.
    #[instrument(skip(self, post))]
    pub async fn has_post_access(
        &self,
        user_id: Uuid,
        post: &entity::posts::Model,
    ) -> Result<bool> {
        if post.creator_id == user_id {
            return Ok(true);
        }

        if post.is_special {
            let purchased = entity::purchased_content::Entity::find()
                .filter(entity::purchased_content::Column::UserId.eq(user_id))
                .filter(entity::purchased_content::Column::PostId.eq(post.id))
                .one(&self.db)
                .await?;
            return Ok(purchased.is_some());
        }

        let now = OffsetDateTime::now_utc();
        let subscription = entity::subscriptions::Entity::find()
            .filter(entity::subscriptions::Column::SubscriberId.eq(user_id))
            .filter(entity::subscriptions::Column::CreatorId.eq(post.creator_id))
            .filter(entity::subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(entity::subscriptions::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await?;

        Ok(subscription.is_some())
    }

    /// Expire whatever is currently active for (payer, creator) and
    /// insert the freshly paid subscription. Keeps the one-active-row
    /// invariant inside the grant transaction.
    async fn replace_active_subscription(
        &self,
        subscriber_id: Uuid,
        creator_id: Uuid,
        bundle_id: Uuid,
        now: OffsetDateTime,
        txn: &DatabaseTransaction,
    ) -> Result<()> {
        let bundle = entity::subscription_bundles::Entity::find_by_id(bundle_id)
            .one(txn)
            .await?
            .ok_or_else(|| ApiError::NotFound("Bundle no longer exists".to_string()))?;

        let duration = BundleDuration::from_str(&bundle.duration).ok_or_else(|| {
            ApiError::Internal(anyhow!("Corrupt bundle duration '{}'", bundle.duration))
        })?;

        self.expire_active_subscriptions(subscriber_id, creator_id, txn)
            .await?;

        let subscription = entity::subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            subscriber_id: Set(subscriber_id),
            creator_id: Set(creator_id),
            bundle_id: Set(bundle_id),
            subscribed_at: Set(now),
            expires_at: Set(subscription_expiry(now, duration)),
            status: Set(SubscriptionStatus::Active.as_str().to_string()),
        };
        subscription.insert(txn).await?;

        Ok(())
    }

    async fn expire_active_subscriptions(
        &self,
        subscriber_id: Uuid,
        creator_id: Uuid,
        txn: &DatabaseTransaction,
    ) -> Result<()> {
        entity::subscriptions::Entity::update_many()
            .col_expr(
                entity::subscriptions::Column::Status,
                Expr::value(SubscriptionStatus::Expired.as_str()),
            )
            .filter(entity::subscriptions::Column::SubscriberId.eq(subscriber_id))
            .filter(entity::subscriptions::Column::CreatorId.eq(creator_id))
            .filter(entity::subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .exec(txn)
            .await?;

        Ok(())
    }
}
