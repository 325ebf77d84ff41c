use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use sea_orm::EntityTrait;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::{
        common::{MessageResponse, PaymentPurpose},
        payments::{
            PaymentLinkResponse, PostView, SubscribeFreeRequest, SubscribeRequest, TipRequest,
            UnlockSpecialRequest, VerificationResponse, VerifyQuery, WebhookEvent,
        },
    },
};

async fn current_user(state: &AppState, user_id: Uuid) -> Result<entity::users::Model> {
    entity::users::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))
}

/// POST /api/v1/profile/subscribe
#[instrument(skip(state, identity, request))]
pub async fn subscribe(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<PaymentLinkResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let payer = current_user(&state, identity.user_id).await?;

    let response = state
        .payments
        .initialize_subscription(&payer, request.creator_id, request.bundle_id)
        .await?;

    Ok(Json(response))
}

/// POST /api/v1/profile/subscribe-free
#[instrument(skip(state, identity, request))]
pub async fn subscribe_free(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<SubscribeFreeRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .entitlements
        .grant_free_subscription(identity.user_id, request.creator_id, request.bundle_id)
        .await?;

    Ok(Json(MessageResponse::new("Subscribed")))
}

/// POST /api/v1/profile/unlock-special-content
#[instrument(skip(state, identity, request))]
pub async fn unlock_special_content(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<UnlockSpecialRequest>,
) -> Result<Json<PaymentLinkResponse>> {
    let payer = current_user(&state, identity.user_id).await?;

    let response = state
        .payments
        .initialize_special(&payer, request.post_id)
        .await?;

    Ok(Json(response))
}

/// POST /api/v1/profile/posts/{id}/tip
#[instrument(skip(state, identity, request))]
pub async fn tip_post(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(post_id): Path<Uuid>,
    Json(request): Json<TipRequest>,
) -> Result<Json<PaymentLinkResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let payer = current_user(&state, identity.user_id).await?;

    let response = state
        .payments
        .initialize_post_tip(&payer, post_id, request.amount, request.message)
        .await?;

    Ok(Json(response))
}

/// POST /api/v1/profile/tip-creator/{id}
#[instrument(skip(state, identity, request))]
pub async fn tip_creator(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(creator_id): Path<Uuid>,
    Json(request): Json<TipRequest>,
) -> Result<Json<PaymentLinkResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let payer = current_user(&state, identity.user_id).await?;

    let response = state
        .payments
        .initialize_tip(&payer, creator_id, None, request.amount, request.message)
        .await?;

    Ok(Json(response))
}

/// GET /api/v1/profile/verify-payment
#[instrument(skip(state))]
pub async fn verify_payment(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationResponse>> {
    let response = state
        .payments
        .verify_redirect(
            &query.tx_ref,
            query.status.as_deref(),
            query.transaction_id.as_deref(),
            PaymentPurpose::Subscription,
        )
        .await?;

    Ok(Json(response))
}

/// GET /api/v1/profile/verify-special-payment
#[instrument(skip(state))]
pub async fn verify_special_payment(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationResponse>> {
    let response = state
        .payments
        .verify_redirect(
            &query.tx_ref,
            query.status.as_deref(),
            query.transaction_id.as_deref(),
            PaymentPurpose::Special,
        )
        .await?;

    Ok(Json(response))
}

/// GET /api/v1/profile/verify-tip-payment
#[instrument(skip(state))]
pub async fn verify_tip_payment(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerificationResponse>> {
    let response = state
        .payments
        .verify_redirect(
            &query.tx_ref,
            query.status.as_deref(),
            query.transaction_id.as_deref(),
            PaymentPurpose::Tip,
        )
        .await?;

    Ok(Json(response))
}

/// POST /api/v1/profile/webhook
///
/// Authenticated by the provider's signature header, not by JWT.
#[instrument(skip(state, headers, event))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<MessageResponse>> {
    let signature = headers
        .get("verif-hash")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing webhook signature".to_string()))?;

    if !state.gateway.webhook_signature_valid(signature) {
        return Err(ApiError::Unauthorized(
            "Invalid webhook signature".to_string(),
        ));
    }

    state
        .payments
        .handle_webhook(&event.event, event.data.id, &event.data.tx_ref)
        .await?;

    Ok(Json(MessageResponse::new("ok")))
}

/// GET /api/v1/profile/posts/{id}
///
/// Full media URL only when the requester is entitled; otherwise the
/// preview (if any) and the unlock price.
#[instrument(skip(state, identity))]
pub async fn get_post(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostView>> {
    let post = state.entitlements.get_post(post_id).await?;
    let has_access = state
        .entitlements
        .has_post_access(identity.user_id, &post)
        .await?;

    let media_url = if has_access {
        Some(state.storage.signed_media_url(&post.media_key).await?)
    } else {
        None
    };

    let preview_url = match &post.preview_key {
        Some(key) => Some(state.storage.signed_media_url(key).await?),
        None => None,
    };

    Ok(Json(PostView {
        id: post.id,
        creator_id: post.creator_id,
        caption: post.caption,
        is_special: post.is_special,
        unlock_price: post.unlock_price,
        has_access,
        media_url,
        preview_url,
    }))
}
