/// Test settlement side effects and redirect terminal states
///
/// A settled tip carrying a message must land in the recipient's chat
/// flagged as a tip; a payer-cancelled redirect must resolve the
/// intent to cancelled without granting anything.
use fanvault::models::common::PaymentPurpose;
use fanvault::models::payments::VerificationStatus;
use fanvault::services::entitlements_service::GrantOutcome;
use fanvault::services::gateway_service::VerifiedCharge;
use fanvault::services::{ChatService, EntitlementsService, PaymentsService};
use sea_orm::{entity::*, query::*, DatabaseConnection};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{seed_bundle, seed_pending_intent, seed_user, setup_test_db, unreachable_gateway};

fn payments_service(db: &DatabaseConnection) -> PaymentsService {
    PaymentsService::new(
        db.clone(),
        Arc::new(unreachable_gateway()),
        Arc::new(EntitlementsService::new(db.clone())),
        Arc::new(ChatService::new(db.clone())),
        "http://localhost:8080".to_string(),
    )
}

async fn seed_tip_intent_with_message(
    db: &DatabaseConnection,
    tx_ref: &str,
    payer_id: Uuid,
    creator_id: Uuid,
    amount: i64,
    message: &str,
) {
    let now = OffsetDateTime::now_utc();

    entity::payment_intents::ActiveModel {
        id: Set(Uuid::new_v4()),
        tx_ref: Set(tx_ref.to_string()),
        payer_id: Set(payer_id),
        creator_id: Set(creator_id),
        bundle_id: Set(None),
        post_id: Set(None),
        amount: Set(amount),
        purpose: Set("tip".to_string()),
        status: Set("pending".to_string()),
        tip_message: Set(Some(message.to_string())),
        provider_tx_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed tip intent");
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_settled_tip_appends_chat_message() {
    let db = setup_test_db().await;
    let service = payments_service(&db);

    let payer = seed_user(&db, false, 0).await;
    let creator = seed_user(&db, true, 0).await;

    let tx_ref = format!("TIP_test_{}", Uuid::new_v4());
    seed_tip_intent_with_message(&db, &tx_ref, payer.id, creator.id, 500, "keep it up!").await;

    let charge = VerifiedCharge {
        tx_ref: tx_ref.clone(),
        amount: 500,
        currency: "NGN".to_string(),
        status: "successful".to_string(),
    };

    let outcome = service
        .settle_charge(&tx_ref, &charge, Some("tx-1"))
        .await
        .expect("Tip settlement should succeed");
    assert!(matches!(outcome, GrantOutcome::Granted(_)));

    // The message landed in the recipient's chat, flagged as a tip
    let messages = entity::chat_messages::Entity::find()
        .filter(entity::chat_messages::Column::SenderId.eq(payer.id))
        .filter(entity::chat_messages::Column::RecipientId.eq(creator.id))
        .all(&db)
        .await
        .expect("Failed to query chat messages");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_tip);
    assert_eq!(messages[0].tip_amount, Some(500));
    assert_eq!(messages[0].body, "keep it up!");

    // Creator still credited 75%
    let creator_after = entity::users::Entity::find_by_id(creator.id)
        .one(&db)
        .await
        .expect("Failed to query creator")
        .expect("Creator vanished");
    assert_eq!(creator_after.total_earnings, 375);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_tip_without_message_skips_chat() {
    let db = setup_test_db().await;
    let service = payments_service(&db);

    let payer = seed_user(&db, false, 0).await;
    let creator = seed_user(&db, true, 0).await;

    let tx_ref = format!("TIP_test_{}", Uuid::new_v4());
    seed_pending_intent(&db, &tx_ref, payer.id, creator.id, None, 500, "tip").await;

    let charge = VerifiedCharge {
        tx_ref: tx_ref.clone(),
        amount: 500,
        currency: "NGN".to_string(),
        status: "successful".to_string(),
    };

    service
        .settle_charge(&tx_ref, &charge, Some("tx-1"))
        .await
        .expect("Tip settlement should succeed");

    let messages = entity::chat_messages::Entity::find()
        .filter(entity::chat_messages::Column::SenderId.eq(payer.id))
        .filter(entity::chat_messages::Column::RecipientId.eq(creator.id))
        .all(&db)
        .await
        .expect("Failed to query chat messages");
    assert!(messages.is_empty());
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_cancelled_redirect_is_terminal_without_grant() {
    let db = setup_test_db().await;
    let service = payments_service(&db);

    let payer = seed_user(&db, false, 0).await;
    let creator = seed_user(&db, true, 0).await;
    let bundle = seed_bundle(&db, creator.id, 1000).await;

    let tx_ref = format!("SUB_test_{}", Uuid::new_v4());
    seed_pending_intent(
        &db,
        &tx_ref,
        payer.id,
        creator.id,
        Some(bundle.id),
        1000,
        "subscription",
    )
    .await;

    // Payer backed out at the provider; no transaction_id comes back
    let response = service
        .verify_redirect(&tx_ref, Some("cancelled"), None, PaymentPurpose::Subscription)
        .await
        .expect("Cancellation should resolve, not error");
    assert_eq!(response.status, VerificationStatus::Cancelled);

    let intent = entity::payment_intents::Entity::find()
        .filter(entity::payment_intents::Column::TxRef.eq(tx_ref.as_str()))
        .one(&db)
        .await
        .expect("Failed to query intent")
        .expect("Intent vanished");
    assert_eq!(intent.status, "cancelled");

    // Nothing was granted or credited
    let ledger = entity::transactions::Entity::find()
        .filter(entity::transactions::Column::TxRef.eq(tx_ref.as_str()))
        .all(&db)
        .await
        .expect("Failed to query ledger");
    assert!(ledger.is_empty());

    let subs = entity::subscriptions::Entity::find()
        .filter(entity::subscriptions::Column::SubscriberId.eq(payer.id))
        .filter(entity::subscriptions::Column::CreatorId.eq(creator.id))
        .all(&db)
        .await
        .expect("Failed to query subscriptions");
    assert!(subs.is_empty());

    let creator_after = entity::users::Entity::find_by_id(creator.id)
        .one(&db)
        .await
        .expect("Failed to query creator")
        .expect("Creator vanished");
    assert_eq!(creator_after.total_earnings, 0);
}
