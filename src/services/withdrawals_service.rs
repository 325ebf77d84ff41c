use crate::{
    error::{ApiError, Result},
    models::common::WithdrawalStatus,
    services::PaymentGateway,
};
use sea_orm::{entity::*, query::*, DatabaseConnection, TransactionTrait};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Flat platform fee on payouts.
pub const WITHDRAWAL_FEE_PERCENT: i64 = 25;
/// Smallest amount a creator may withdraw.
pub const MIN_WITHDRAWAL: i64 = 1000;

/// Fee and payout for a withdrawal of `amount`.
pub fn withdrawal_fee(amount: i64) -> (i64, i64) {
    let fee = amount * WITHDRAWAL_FEE_PERCENT / 100;
    (fee, amount - fee)
}

pub struct WithdrawalsService {
    db: DatabaseConnection,
    gateway: Arc<PaymentGateway>,
}

impl WithdrawalsService {
    pub fn new(db: DatabaseConnection, gateway: Arc<PaymentGateway>) -> Self {
        Self { db, gateway }
    }

    /// Creator-initiated payout. The balance is deducted inside a
    /// transaction that locks the user row, so two concurrent requests
    /// cannot both pass the balance check; a failed bank transfer
    /// refunds the deduction.
    #[instrument(skip(self))]
    pub async fn request_withdrawal(
        &self,
        creator_id: Uuid,
        amount: i64,
    ) -> Result<entity::withdrawal_requests::Model> {
        if amount < MIN_WITHDRAWAL {
            return Err(ApiError::BadRequest(format!(
                "Minimum withdrawal is {}",
                MIN_WITHDRAWAL
            )));
        }

        let (fee, payout) = withdrawal_fee(amount);
        let now = OffsetDateTime::now_utc();

        let txn = self.db.begin().await?;

        let creator = entity::users::Entity::find_by_id(creator_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound("Creator not found".to_string()))?;

        if !creator.is_creator {
            return Err(ApiError::BadRequest(
                "Only creators can withdraw earnings".to_string(),
            ));
        }

        let (bank_code, account_number, account_name) = match (
            &creator.bank_code,
            &creator.bank_account_number,
            &creator.bank_account_name,
        ) {
            (Some(code), Some(number), Some(name)) => {
                (code.clone(), number.clone(), name.clone())
            }
            _ => {
                return Err(ApiError::BadRequest(
                    "Add your bank details before withdrawing".to_string(),
                ))
            }
        };

        if creator.total_earnings < amount {
            txn.rollback().await?;
            return Err(ApiError::InsufficientBalance(format!(
                "Balance {} is less than requested {}",
                creator.total_earnings, amount
            )));
        }

        let balance = creator.total_earnings;
        let mut creator_active: entity::users::ActiveModel = creator.into();
        creator_active.total_earnings = Set(balance - amount);
        creator_active.update(&txn).await?;

        let request_id = Uuid::new_v4();
        let request = entity::withdrawal_requests::ActiveModel {
            id: Set(request_id),
            creator_id: Set(creator_id),
            amount: Set(amount),
            fee: Set(fee),
            payout: Set(payout),
            status: Set(WithdrawalStatus::Pending.as_str().to_string()),
            failure_reason: Set(None),
            requested_at: Set(now),
            processed_at: Set(None),
        };
        let request = request.insert(&txn).await?;

        txn.commit().await?;

        info!(
            "Reserved withdrawal {} for creator {}: amount={}, payout={}",
            request_id, creator_id, amount, payout
        );

        self.execute_transfer(request, &bank_code, &account_number, &account_name)
            .await
    }

    /// Retry payout requests stuck pending (e.g. process died between
    /// reserving the balance and the bank transfer completing).
    #[instrument(skip(self))]
    pub async fn sweep_pending(&self, older_than: time::Duration) -> Result<usize> {
        let cutoff = OffsetDateTime::now_utc() - older_than;

        let stuck = entity::withdrawal_requests::Entity::find()
            .filter(
                entity::withdrawal_requests::Column::Status
                    .eq(WithdrawalStatus::Pending.as_str()),
            )
            .filter(entity::withdrawal_requests::Column::RequestedAt.lt(cutoff))
            .order_by_asc(entity::withdrawal_requests::Column::RequestedAt)
            .all(&self.db)
            .await?;

        let mut processed = 0;
        for request in stuck {
            let creator = entity::users::Entity::find_by_id(request.creator_id)
                .one(&self.db)
                .await?;

            let Some(creator) = creator else {
                warn!(
                    "Sweep: creator {} for request {} no longer exists",
                    request.creator_id, request.id
                );
                continue;
            };

            let (Some(bank_code), Some(account_number), Some(account_name)) = (
                creator.bank_code.clone(),
                creator.bank_account_number.clone(),
                creator.bank_account_name.clone(),
            ) else {
                self.fail_and_refund(request, "bank details removed").await?;
                processed += 1;
                continue;
            };

            match self
                .execute_transfer(request, &bank_code, &account_number, &account_name)
                .await
            {
                Ok(_) => processed += 1,
                Err(e) => warn!("Sweep: transfer attempt failed: {:?}", e),
            }
        }

        Ok(processed)
    }

    /// Current balance plus the creator's most recent ledger rows.
    #[instrument(skip(self))]
    pub async fn earnings(
        &self,
        creator_id: Uuid,
    ) -> Result<(i64, Vec<entity::transactions::Model>)> {
        let creator = entity::users::Entity::find_by_id(creator_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Creator not found".to_string()))?;

        let recent = entity::transactions::Entity::find()
            .filter(entity::transactions::Column::CreatorId.eq(creator_id))
            .order_by_desc(entity::transactions::Column::CreatedAt)
            .limit(20)
            .all(&self.db)
            .await?;

        Ok((creator.total_earnings, recent))
    }

    /// Store payout destination on the creator's account.
    #[instrument(skip(self, account_number, account_name))]
    pub async fn set_bank_details(
        &self,
        user_id: Uuid,
        bank_code: &str,
        account_number: &str,
        account_name: &str,
    ) -> Result<()> {
        let user = entity::users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let mut user_active: entity::users::ActiveModel = user.into();
        user_active.bank_code = Set(Some(bank_code.to_string()));
        user_active.bank_account_number = Set(Some(account_number.to_string()));
        user_active.bank_account_name = Set(Some(account_name.to_string()));
        user_active.update(&self.db).await?;

        Ok(())
    }

    async fn execute_transfer(
        &self,
        request: entity::withdrawal_requests::Model,
        bank_code: &str,
        account_number: &str,
        account_name: &str,
    ) -> Result<entity::withdrawal_requests::Model> {
        let reference = format!("WD_{}", request.id);
        let narration = format!("Creator payout for {}", account_name);

        let transfer = self
            .gateway
            .transfer_to_bank(
                bank_code,
                account_number,
                request.payout,
                &narration,
                &reference,
            )
            .await;

        match transfer {
            Ok(receipt) => {
                let request_id = request.id;
                let mut active: entity::withdrawal_requests::ActiveModel = request.into();
                active.status = Set(WithdrawalStatus::Completed.as_str().to_string());
                active.processed_at = Set(Some(OffsetDateTime::now_utc()));
                let model = active.update(&self.db).await?;

                info!(
                    "Withdrawal {} completed (provider transfer {})",
                    request_id, receipt.provider_transfer_id
                );

                Ok(model)
            }
            Err(e) => {
                let model = self.fail_and_refund(request, &e.to_string()).await?;
                warn!("Withdrawal {} failed and was refunded: {}", model.id, e);
                Ok(model)
            }
        }
    }

    /// Mark the request failed and return the reserved amount to the
    /// creator's balance, atomically.
    async fn fail_and_refund(
        &self,
        request: entity::withdrawal_requests::Model,
        reason: &str,
    ) -> Result<entity::withdrawal_requests::Model> {
        let txn = self.db.begin().await?;

        let creator = entity::users::Entity::find_by_id(request.creator_id)
            .lock_exclusive()
            .one(&txn)
            .await?;

        if let Some(creator) = creator {
            let balance = creator.total_earnings;
            let mut creator_active: entity::users::ActiveModel = creator.into();
            creator_active.total_earnings = Set(balance + request.amount);
            creator_active.update(&txn).await?;
        }

        let mut active: entity::withdrawal_requests::ActiveModel = request.into();
        active.status = Set(WithdrawalStatus::Failed.as_str().to_string());
        active.failure_reason = Set(Some(reason.to_string()));
        active.processed_at = Set(Some(OffsetDateTime::now_utc()));
        let model = active.update(&txn).await?;

        txn.commit().await?;

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_flat_25_percent() {
        let (fee, payout) = withdrawal_fee(1000);
        assert_eq!(fee, 250);
        assert_eq!(payout, 750);
    }

    #[test]
    fn fee_and_payout_always_sum_to_amount() {
        for amount in [MIN_WITHDRAWAL, 1001, 5437, 1_000_000] {
            let (fee, payout) = withdrawal_fee(amount);
            assert_eq!(fee + payout, amount);
            assert!(payout > 0);
        }
    }
}
