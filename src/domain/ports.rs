use super::account::{Account, AccountId, Amount, Balance, NewAccount};
use super::payment::Payment;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates the account and assigns its internal id. Duplicate account
    /// ids, usernames, and emails are rejected with distinct errors.
    async fn create(&self, account: NewAccount) -> Result<Account>;

    async fn find_by_account_id(&self, account_id: &AccountId) -> Result<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Administrative balance overwrite. Balance deltas in the transfer path
    /// go through `TransferStore::commit_transfer` only.
    async fn set_balance(&self, account_id: &AccountId, balance: Balance) -> Result<Account>;
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<Payment>>;

    /// Payments involving the account as payer or receiver, newest first,
    /// optionally restricted to commit years `>= from_year`. Only committed
    /// entries are ever visible.
    async fn find_by_account(
        &self,
        account_id: &AccountId,
        from_year: Option<i32>,
    ) -> Result<Vec<Payment>>;
}

/// A storage backend able to apply a whole transfer as one atomic unit.
///
/// The ledger append is not exposed on its own: payments come into existence
/// only through `commit_transfer`, which also assigns their monotonic id.
#[async_trait]
pub trait TransferStore: AccountStore + PaymentLedger {
    /// Debits the payer, credits the receiver, and appends the payment record
    /// so that either all three changes become visible or none do. Fails
    /// without any mutation if an account is missing or the debit would
    /// overdraw the payer.
    async fn commit_transfer(
        &self,
        payer: &AccountId,
        receiver: &AccountId,
        amount: Amount,
        date: DateTime<Utc>,
    ) -> Result<Payment>;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type TransferStoreBox = Box<dyn TransferStore>;
