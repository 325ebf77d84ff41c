/// Test the free/paid catalog toggle
///
/// Enabling free mode replaces the paid catalog with a single free
/// bundle; disabling removes it and expires the subscriptions it
/// granted.
use fanvault::error::ApiError;
use fanvault::models::bundles::CreateBundleRequest;
use fanvault::services::{BundlesService, EntitlementsService};
use sea_orm::{entity::*, query::*};

use crate::{seed_user, setup_test_db};

fn monthly_bundle_request(price: i64) -> CreateBundleRequest {
    CreateBundleRequest {
        title: "Monthly".to_string(),
        price,
        duration: "month".to_string(),
        discount_percent: None,
        discount_expires_at: None,
    }
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_enable_free_mode_replaces_paid_catalog() {
    let db = setup_test_db().await;
    let service = BundlesService::new(db.clone());

    let creator = seed_user(&db, true, 0).await;

    service
        .create_bundle(creator.id, monthly_bundle_request(1000))
        .await
        .expect("Failed to create bundle");
    service
        .create_bundle(creator.id, monthly_bundle_request(2500))
        .await
        .expect("Failed to create bundle");

    service
        .set_free_mode(creator.id, true)
        .await
        .expect("Failed to enable free mode");

    let bundles = service
        .list_bundles(creator.id)
        .await
        .expect("Failed to list bundles");
    assert_eq!(bundles.len(), 1);
    assert!(bundles[0].is_free);
    assert_eq!(bundles[0].price, 0);

    // Enabling again is a no-op, not an error
    service
        .set_free_mode(creator.id, true)
        .await
        .expect("Repeat enable should be idempotent");
    let bundles = service
        .list_bundles(creator.id)
        .await
        .expect("Failed to list bundles");
    assert_eq!(bundles.len(), 1);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_paid_bundle_rejected_in_free_mode() {
    let db = setup_test_db().await;
    let service = BundlesService::new(db.clone());

    let creator = seed_user(&db, true, 0).await;

    service
        .set_free_mode(creator.id, true)
        .await
        .expect("Failed to enable free mode");

    let result = service
        .create_bundle(creator.id, monthly_bundle_request(1000))
        .await;
    assert!(matches!(result, Err(ApiError::Conflict(_))));
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_disable_free_mode_expires_subscriptions() {
    let db = setup_test_db().await;
    let bundles = BundlesService::new(db.clone());
    let entitlements = EntitlementsService::new(db.clone());

    let creator = seed_user(&db, true, 0).await;
    let subscriber = seed_user(&db, false, 0).await;

    bundles
        .set_free_mode(creator.id, true)
        .await
        .expect("Failed to enable free mode");

    let free_bundle = bundles
        .list_bundles(creator.id)
        .await
        .expect("Failed to list bundles")
        .into_iter()
        .next()
        .expect("Free bundle missing");

    let subscription = entitlements
        .grant_free_subscription(subscriber.id, creator.id, free_bundle.id)
        .await
        .expect("Free subscription should be granted");
    assert_eq!(subscription.status, "active");

    bundles
        .set_free_mode(creator.id, false)
        .await
        .expect("Failed to disable free mode");

    // The free bundle is gone and its subscriptions are expired
    let remaining = bundles
        .list_bundles(creator.id)
        .await
        .expect("Failed to list bundles");
    assert!(remaining.is_empty());

    let subscription_after = entity::subscriptions::Entity::find_by_id(subscription.id)
        .one(&db)
        .await
        .expect("Failed to query subscription")
        .expect("Subscription vanished");
    assert_eq!(subscription_after.status, "expired");

    // Disabling again with no free bundle is a no-op
    bundles
        .set_free_mode(creator.id, false)
        .await
        .expect("Repeat disable should be idempotent");
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_creator_cannot_free_subscribe_to_self() {
    let db = setup_test_db().await;
    let bundles = BundlesService::new(db.clone());
    let entitlements = EntitlementsService::new(db.clone());

    let creator = seed_user(&db, true, 0).await;

    bundles
        .set_free_mode(creator.id, true)
        .await
        .expect("Failed to enable free mode");

    let free_bundle = bundles
        .list_bundles(creator.id)
        .await
        .expect("Failed to list bundles")
        .into_iter()
        .next()
        .expect("Free bundle missing");

    let result = entitlements
        .grant_free_subscription(creator.id, creator.id, free_bundle.id)
        .await;
    assert!(matches!(result, Err(ApiError::BadRequest(_))));

    let subs = entity::subscriptions::Entity::find()
        .filter(entity::subscriptions::Column::SubscriberId.eq(creator.id))
        .all(&db)
        .await
        .expect("Failed to query subscriptions");
    assert!(subs.is_empty());
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_free_subscription_requires_free_bundle() {
    let db = setup_test_db().await;
    let bundles = BundlesService::new(db.clone());
    let entitlements = EntitlementsService::new(db.clone());

    let creator = seed_user(&db, true, 0).await;
    let subscriber = seed_user(&db, false, 0).await;

    let paid = bundles
        .create_bundle(creator.id, monthly_bundle_request(1000))
        .await
        .expect("Failed to create bundle");

    let result = entitlements
        .grant_free_subscription(subscriber.id, creator.id, paid.id)
        .await;
    assert!(result.is_err(), "Paid bundle must not grant free access");

    let subs = entity::subscriptions::Entity::find()
        .filter(entity::subscriptions::Column::SubscriberId.eq(subscriber.id))
        .all(&db)
        .await
        .expect("Failed to query subscriptions");
    assert!(subs.is_empty());
}
