use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::{
        bundles::{BundleResponse, CreateBundleRequest, FreeModeRequest},
        common::MessageResponse,
        withdrawals::{
            BankDetailsRequest, EarningsResponse, LedgerEntry, WithdrawRequest,
            WithdrawalResponse,
        },
    },
};

fn require_creator(identity: &UserIdentity) -> Result<()> {
    if !identity.is_creator {
        return Err(ApiError::Unauthorized(
            "Creator account required".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/dashboard/bundles
#[instrument(skip(state, identity, request))]
pub async fn create_bundle(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<CreateBundleRequest>,
) -> Result<Json<BundleResponse>> {
    require_creator(&identity)?;
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let bundle = state
        .bundles
        .create_bundle(identity.user_id, request)
        .await?;

    Ok(Json(bundle.into()))
}

/// GET /api/v1/dashboard/bundles
#[instrument(skip(state, identity))]
pub async fn list_bundles(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<Vec<BundleResponse>>> {
    require_creator(&identity)?;

    let bundles = state.bundles.list_bundles(identity.user_id).await?;

    Ok(Json(bundles.into_iter().map(BundleResponse::from).collect()))
}

/// DELETE /api/v1/dashboard/bundles/{id}
#[instrument(skip(state, identity))]
pub async fn delete_bundle(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(bundle_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    require_creator(&identity)?;

    state
        .bundles
        .delete_bundle(identity.user_id, bundle_id)
        .await?;

    Ok(Json(MessageResponse::new("Bundle deleted")))
}

/// POST /api/v1/dashboard/free-mode
#[instrument(skip(state, identity))]
pub async fn set_free_mode(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<FreeModeRequest>,
) -> Result<Json<MessageResponse>> {
    require_creator(&identity)?;

    state
        .bundles
        .set_free_mode(identity.user_id, request.enabled)
        .await?;

    let message = if request.enabled {
        "Free mode enabled"
    } else {
        "Free mode disabled"
    };
    Ok(Json(MessageResponse::new(message)))
}

/// POST /api/v1/dashboard/withdraw
#[instrument(skip(state, identity, request))]
pub async fn withdraw(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<WithdrawalResponse>> {
    require_creator(&identity)?;
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let withdrawal = state
        .withdrawals
        .request_withdrawal(identity.user_id, request.amount)
        .await?;

    Ok(Json(withdrawal.into()))
}

/// POST /api/v1/dashboard/bank-details
#[instrument(skip(state, identity, request))]
pub async fn set_bank_details(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<BankDetailsRequest>,
) -> Result<Json<MessageResponse>> {
    require_creator(&identity)?;
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    if !request.account_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "Account number must be numeric".to_string(),
        ));
    }

    state
        .withdrawals
        .set_bank_details(
            identity.user_id,
            &request.bank_code,
            &request.account_number,
            &request.account_name,
        )
        .await?;

    Ok(Json(MessageResponse::new("Bank details saved")))
}

/// GET /api/v1/dashboard/earnings
#[instrument(skip(state, identity))]
pub async fn earnings(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<EarningsResponse>> {
    require_creator(&identity)?;

    let (total_earnings, recent) = state.withdrawals.earnings(identity.user_id).await?;

    Ok(Json(EarningsResponse {
        total_earnings,
        recent_transactions: recent.into_iter().map(LedgerEntry::from).collect(),
    }))
}
