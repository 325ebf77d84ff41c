use crate::{
    error::{ApiError, Result},
    models::{
        common::{IntentStatus, PaymentPurpose},
        payments::{PaymentLinkResponse, VerificationResponse, VerificationStatus},
    },
    services::{
        entitlements_service::GrantOutcome, gateway_service::VerifiedCharge, ChatService,
        EntitlementsService, PaymentGateway,
    },
};
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Orchestrates the payment lifecycle: issue a payment link backed by
/// a pending intent, then resolve the intent exactly once when the
/// provider reports back (redirect or webhook).
pub struct PaymentsService {
    db: DatabaseConnection,
    gateway: Arc<PaymentGateway>,
    entitlements: Arc<EntitlementsService>,
    chat: Arc<ChatService>,
    base_url: String,
}

impl PaymentsService {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<PaymentGateway>,
        entitlements: Arc<EntitlementsService>,
        chat: Arc<ChatService>,
        base_url: String,
    ) -> Self {
        Self {
            db,
            gateway,
            entitlements,
            chat,
            base_url,
        }
    }

    /// Start a paid subscription: price the bundle (discount applied),
    /// persist a pending intent, and hand back the provider's link.
    #[instrument(skip(self, payer))]
    pub async fn initialize_subscription(
        &self,
        payer: &entity::users::Model,
        creator_id: Uuid,
        bundle_id: Uuid,
    ) -> Result<PaymentLinkResponse> {
        if payer.id == creator_id {
            return Err(ApiError::BadRequest(
                "You cannot subscribe to yourself".to_string(),
            ));
        }

        let bundle = entity::subscription_bundles::Entity::find_by_id(bundle_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Bundle not found".to_string()))?;

        if bundle.creator_id != creator_id {
            return Err(ApiError::BadRequest(
                "Bundle does not belong to this creator".to_string(),
            ));
        }
        if bundle.is_free {
            return Err(ApiError::BadRequest(
                "Bundle is free; use the free subscribe flow".to_string(),
            ));
        }

        let amount = crate::services::bundles_service::effective_price(
            &bundle,
            OffsetDateTime::now_utc(),
        );
        let tx_ref = make_tx_ref("SUB", &[&creator_id.to_string(), &bundle_id.to_string()]);

        self.open_intent_and_link(
            payer,
            creator_id,
            Some(bundle_id),
            None,
            amount,
            PaymentPurpose::Subscription,
            None,
            &tx_ref,
            &format!("Subscription: {}", bundle.title),
            "verify-payment",
        )
        .await
    }

    /// Start a one-time unlock of a special post.
    #[instrument(skip(self, payer))]
    pub async fn initialize_special(
        &self,
        payer: &entity::users::Model,
        post_id: Uuid,
    ) -> Result<PaymentLinkResponse> {
        let post = entity::posts::Entity::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

        if post.creator_id == payer.id {
            return Err(ApiError::BadRequest(
                "You cannot unlock your own post".to_string(),
            ));
        }

        let amount = match (post.is_special, post.unlock_price) {
            (true, Some(price)) => price,
            _ => {
                return Err(ApiError::BadRequest(
                    "Post is not locked special content".to_string(),
                ))
            }
        };

        let already = entity::purchased_content::Entity::find()
            .filter(entity::purchased_content::Column::UserId.eq(payer.id))
            .filter(entity::purchased_content::Column::PostId.eq(post_id))
            .one(&self.db)
            .await?;
        if already.is_some() {
            return Err(ApiError::Conflict(
                "You have already unlocked this post".to_string(),
            ));
        }

        let tx_ref = make_tx_ref("SPECIAL", &[&post_id.to_string()]);

        self.open_intent_and_link(
            payer,
            post.creator_id,
            None,
            Some(post_id),
            amount,
            PaymentPurpose::Special,
            None,
            &tx_ref,
            "Unlock special content",
            "verify-special-payment",
        )
        .await
    }

    /// Start a tip, optionally attached to a post and carrying a chat
    /// message delivered after settlement.
    #[instrument(skip(self, payer, message))]
    pub async fn initialize_tip(
        &self,
        payer: &entity::users::Model,
        creator_id: Uuid,
        post_id: Option<Uuid>,
        amount: i64,
        message: Option<String>,
    ) -> Result<PaymentLinkResponse> {
        if payer.id == creator_id {
            return Err(ApiError::BadRequest("You cannot tip yourself".to_string()));
        }

        let creator = entity::users::Entity::find_by_id(creator_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Creator not found".to_string()))?;

        if !creator.is_creator {
            return Err(ApiError::BadRequest(
                "Recipient is not a creator".to_string(),
            ));
        }

        if let Some(post_id) = post_id {
            let post = entity::posts::Entity::find_by_id(post_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
            if post.creator_id != creator_id {
                return Err(ApiError::BadRequest(
                    "Post does not belong to this creator".to_string(),
                ));
            }
        }

        let tx_ref = make_tx_ref("TIP", &[&creator_id.to_string()]);

        self.open_intent_and_link(
            payer,
            creator_id,
            None,
            post_id,
            amount,
            PaymentPurpose::Tip,
            message,
            &tx_ref,
            "Tip",
            "verify-tip-payment",
        )
        .await
    }

    /// Tip attached to a specific post; the recipient is the post's
    /// creator.
    #[instrument(skip(self, payer, message))]
    pub async fn initialize_post_tip(
        &self,
        payer: &entity::users::Model,
        post_id: Uuid,
        amount: i64,
        message: Option<String>,
    ) -> Result<PaymentLinkResponse> {
        let post = entity::posts::Entity::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

        self.initialize_tip(payer, post.creator_id, Some(post_id), amount, message)
            .await
    }

    /// Resolve a provider redirect. `status=cancelled` is a terminal
    /// non-error; anything else is verified against the provider
    /// before the grant runs.
    #[instrument(skip(self))]
    pub async fn verify_redirect(
        &self,
        tx_ref: &str,
        provider_status: Option<&str>,
        provider_tx_id: Option<&str>,
        expected_purpose: PaymentPurpose,
    ) -> Result<VerificationResponse> {
        let intent = entity::payment_intents::Entity::find()
            .filter(entity::payment_intents::Column::TxRef.eq(tx_ref))
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No payment intent for {}", tx_ref)))?;

        if intent.purpose != expected_purpose.as_str() {
            return Err(ApiError::BadRequest(format!(
                "Payment {} is a {} payment",
                tx_ref, intent.purpose
            )));
        }

        if provider_status == Some("cancelled") {
            self.resolve_pending_intent(tx_ref, IntentStatus::Cancelled)
                .await?;
            info!("Payment {} cancelled by payer", tx_ref);
            return Ok(VerificationResponse {
                status: VerificationStatus::Cancelled,
                tx_ref: tx_ref.to_string(),
            });
        }

        let provider_tx_id = provider_tx_id.ok_or_else(|| {
            ApiError::BadRequest("Missing transaction_id query parameter".to_string())
        })?;

        let charge = self.gateway.verify_charge(provider_tx_id).await?;

        if charge.tx_ref != tx_ref {
            warn!(
                "Provider charge {} references {} but redirect claimed {}",
                provider_tx_id, charge.tx_ref, tx_ref
            );
            return Err(ApiError::BadRequest(
                "Transaction reference mismatch".to_string(),
            ));
        }

        if !charge.is_successful() {
            self.resolve_pending_intent(tx_ref, IntentStatus::Failed)
                .await?;
            return Ok(VerificationResponse {
                status: VerificationStatus::Failed,
                tx_ref: tx_ref.to_string(),
            });
        }

        let outcome = self.settle_charge(tx_ref, &charge, Some(provider_tx_id)).await?;

        Ok(VerificationResponse {
            status: match outcome {
                GrantOutcome::Granted(_) => VerificationStatus::Granted,
                GrantOutcome::AlreadyGranted => VerificationStatus::AlreadyGranted,
            },
            tx_ref: tx_ref.to_string(),
        })
    }

    /// Handle a provider webhook. Only `charge.success` is acted on;
    /// every other event type is acknowledged and dropped.
    #[instrument(skip(self))]
    pub async fn handle_webhook(&self, event: &str, provider_tx_id: u64, tx_ref: &str) -> Result<()> {
        if event != "charge.success" {
            info!("Ignoring webhook event {}", event);
            return Ok(());
        }

        let charge = self
            .gateway
            .verify_charge(&provider_tx_id.to_string())
            .await?;

        if charge.tx_ref != tx_ref {
            return Err(ApiError::BadRequest(
                "Webhook reference mismatch".to_string(),
            ));
        }

        if !charge.is_successful() {
            self.resolve_pending_intent(tx_ref, IntentStatus::Failed)
                .await?;
            return Ok(());
        }

        self.settle_charge(tx_ref, &charge, Some(&provider_tx_id.to_string()))
            .await?;

        Ok(())
    }

    /// Settle an already-verified successful charge: run the grant,
    /// then deliver post-commit side effects. Shared by the redirect
    /// and webhook paths.
    pub async fn settle_charge(
        &self,
        tx_ref: &str,
        charge: &VerifiedCharge,
        provider_tx_id: Option<&str>,
    ) -> Result<GrantOutcome> {
        let outcome = self.entitlements.grant(tx_ref, charge, provider_tx_id).await?;
        self.apply_side_effects(&outcome).await;
        Ok(outcome)
    }

    /// Tip settlements that carried a message append it to the chat.
    /// Runs after the grant transaction committed; a chat failure must
    /// not unsettle the payment, so it is logged and swallowed.
    async fn apply_side_effects(&self, outcome: &GrantOutcome) {
        let GrantOutcome::Granted(granted) = outcome else {
            return;
        };
        if granted.purpose != PaymentPurpose::Tip {
            return;
        }
        let Some(message) = &granted.tip_message else {
            return;
        };

        if let Err(e) = self
            .chat
            .append_tip_message(granted.payer_id, granted.creator_id, message, granted.amount)
            .await
        {
            warn!(
                "Failed to append tip message for {}: {:?}",
                granted.tx_ref, e
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn open_intent_and_link(
        &self,
        payer: &entity::users::Model,
        creator_id: Uuid,
        bundle_id: Option<Uuid>,
        post_id: Option<Uuid>,
        amount: i64,
        purpose: PaymentPurpose,
        tip_message: Option<String>,
        tx_ref: &str,
        title: &str,
        verify_path: &str,
    ) -> Result<PaymentLinkResponse> {
        let now = OffsetDateTime::now_utc();

        let intent = entity::payment_intents::ActiveModel {
            id: Set(Uuid::new_v4()),
            tx_ref: Set(tx_ref.to_string()),
            payer_id: Set(payer.id),
            creator_id: Set(creator_id),
            bundle_id: Set(bundle_id),
            post_id: Set(post_id),
            amount: Set(amount),
            purpose: Set(purpose.as_str().to_string()),
            status: Set(IntentStatus::Pending.as_str().to_string()),
            tip_message: Set(tip_message),
            provider_tx_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        intent.insert(&self.db).await?;

        let redirect_url = format!("{}/api/v1/profile/{}", self.base_url, verify_path);

        let link = match self
            .gateway
            .create_payment_link(tx_ref, amount, &payer.email, title, &redirect_url)
            .await
        {
            Ok(link) => link,
            Err(e) => {
                // The intent must not stay pending if the provider
                // never learned about it.
                self.resolve_pending_intent(tx_ref, IntentStatus::Failed)
                    .await?;
                return Err(e);
            }
        };

        info!(
            "Opened {} intent {} for amount {}",
            purpose.as_str(),
            tx_ref,
            amount
        );

        Ok(PaymentLinkResponse {
            payment_link: link.link,
            tx_ref: tx_ref.to_string(),
        })
    }

    /// Compare-and-set a pending intent into a terminal state. A
    /// no-op if verification already resolved it.
    async fn resolve_pending_intent(&self, tx_ref: &str, status: IntentStatus) -> Result<()> {
        entity::payment_intents::Entity::update_many()
            .col_expr(
                entity::payment_intents::Column::Status,
                Expr::value(status.as_str()),
            )
            .col_expr(
                entity::payment_intents::Column::UpdatedAt,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(entity::payment_intents::Column::TxRef.eq(tx_ref))
            .filter(
                entity::payment_intents::Column::Status.eq(IntentStatus::Pending.as_str()),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }
}

/// Unique payment reference: PREFIX_<unix_ms>_<part>[_<part>].
fn make_tx_ref(prefix: &str, parts: &[&str]) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut tx_ref = format!("{}_{}", prefix, millis);
    for part in parts {
        tx_ref.push('_');
        tx_ref.push_str(part);
    }
    tx_ref
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_ref_carries_prefix_and_parts() {
        let tx_ref = make_tx_ref("SUB", &["creator-1", "bundle-2"]);
        assert!(tx_ref.starts_with("SUB_"));
        assert!(tx_ref.ends_with("_creator-1_bundle-2"));

        let fields: Vec<&str> = tx_ref.split('_').collect();
        assert_eq!(fields[0], "SUB");
        assert!(fields[1].parse::<i128>().is_ok());
    }

    #[test]
    fn tip_refs_have_single_target() {
        let tx_ref = make_tx_ref("TIP", &["creator-9"]);
        assert_eq!(tx_ref.split('_').count(), 3);
    }
}
