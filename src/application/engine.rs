use crate::domain::account::{AccountId, Amount};
use crate::domain::payment::Payment;
use crate::domain::ports::TransferStoreBox;
use crate::error::TransferError;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table serializing transfers per account.
///
/// Each account id maps to its own mutex; a transfer holds the locks of both
/// participating accounts across the whole read-validate-commit sequence, so
/// transfers over disjoint account pairs proceed concurrently while transfers
/// sharing an account serialize. Locks are acquired in canonical order to
/// rule out deadlock between opposite-direction transfers.
#[derive(Default)]
struct AccountLocks {
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    async fn lock_for(&self, id: &AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }

    /// Guards for both accounts. When the ids coincide only one lock exists,
    /// and taking it twice would deadlock, so a single guard is returned; the
    /// engine rejects that case as a self-transfer.
    async fn lock_pair(
        &self,
        a: &AccountId,
        b: &AccountId,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.lock_for(a).await.lock_owned().await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.lock_for(first).await.lock_owned().await;
        let second = self.lock_for(second).await.lock_owned().await;
        (first, Some(second))
    }
}

/// Validates and atomically executes balance transfers.
///
/// Sole writer of balances in the transfer path and sole creator of
/// `Payment` records. Owns the storage backend through its port.
pub struct TransferEngine {
    store: TransferStoreBox,
    locks: AccountLocks,
}

impl TransferEngine {
    pub fn new(store: TransferStoreBox) -> Self {
        Self {
            store,
            locks: AccountLocks::default(),
        }
    }

    /// Transfers `amount` from `sender` to `receiver` and records the
    /// payment.
    ///
    /// Preconditions are checked in a fixed order, each violation producing
    /// its own error: unknown sender, unknown receiver, self-transfer,
    /// invalid amount, insufficient balance. A rejected transfer leaves both
    /// balances and the ledger untouched, and a storage failure during the
    /// commit rolls back whole (`CommitFailed`); the engine never retries.
    pub async fn transfer(
        &self,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Decimal,
    ) -> Result<Payment, TransferError> {
        let result = self.transfer_locked(sender, receiver, amount).await;
        match &result {
            Ok(payment) => {
                tracing::info!(
                    payment_id = payment.id,
                    payer = %payment.payer,
                    receiver = %payment.receiver,
                    amount = %payment.amount,
                    "transfer committed"
                );
            }
            Err(err @ TransferError::CommitFailed(_)) => {
                tracing::error!(%sender, %receiver, %amount, error = %err, "transfer commit failed");
            }
            Err(err) => {
                tracing::warn!(%sender, %receiver, %amount, code = err.code(), "transfer rejected");
            }
        }
        result
    }

    async fn transfer_locked(
        &self,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Decimal,
    ) -> Result<Payment, TransferError> {
        // Held until the commit returns; validation and mutation form one
        // critical section per account.
        let _guards = self.locks.lock_pair(sender, receiver).await;

        let sender_account = self
            .store
            .find_by_account_id(sender)
            .await?
            .filter(|account| account.is_active)
            .ok_or(TransferError::UnknownSender)?;

        if self
            .store
            .find_by_account_id(receiver)
            .await?
            .filter(|account| account.is_active)
            .is_none()
        {
            return Err(TransferError::UnknownReceiver);
        }

        if sender == receiver {
            return Err(TransferError::SelfTransfer);
        }

        let amount = Amount::new(amount)?;

        if sender_account.balance.checked_debit(amount).is_none() {
            return Err(TransferError::InsufficientBalance);
        }

        // Commit instant, stamped inside the critical section.
        let date = Utc::now();
        let payment = self
            .store
            .commit_transfer(sender, receiver, amount, date)
            .await?;
        Ok(payment)
    }

    /// Committed payments involving the account, newest first.
    pub async fn payments_for(
        &self,
        account_id: &AccountId,
        from_year: Option<i32>,
    ) -> Result<Vec<Payment>, TransferError> {
        Ok(self.store.find_by_account(account_id, from_year).await?)
    }

    pub async fn payment(&self, id: u64) -> Result<Option<Payment>, TransferError> {
        Ok(self.store.find_by_id(id).await?)
    }
}
