use crate::domain::account::{Account, AccountId, Amount, Balance, NewAccount};
use crate::domain::payment::{Payment, PaymentMethod};
use crate::domain::ports::{AccountStore, PaymentLedger, TransferStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store backing all three storage ports.
///
/// All state lives behind one `RwLock`; `commit_transfer` performs its three
/// writes inside a single write-lock section, so readers observe either the
/// pre-transfer or the post-transfer state, never a debited-but-uncredited
/// one. `Clone` shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    accounts: HashMap<AccountId, Account>,
    payments: Vec<Payment>,
    next_account_id: u64,
    next_payment_id: u64,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            payments: Vec::new(),
            next_account_id: 1,
            next_payment_id: 1,
        }
    }
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&account.account_id) {
            return Err(StoreError::DuplicateAccountId);
        }
        if inner.accounts.values().any(|a| a.username == account.username) {
            return Err(StoreError::DuplicateUsername);
        }
        if inner.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let id = inner.next_account_id;
        inner.next_account_id += 1;
        let account = Account {
            id,
            account_id: account.account_id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            balance: account.balance,
            date_joined: account.date_joined,
            is_active: true,
        };
        inner
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_account_id(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.get(account_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn set_balance(&self, account_id: &AccountId, balance: Balance) -> Result<Account> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or(StoreError::AccountNotFound)?;
        account.balance = balance;
        Ok(account.clone())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        from_year: Option<i32>,
    ) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .iter()
            .filter(|p| p.payer == *account_id || p.receiver == *account_id)
            .filter(|p| from_year.is_none_or(|year| p.date.year() >= year))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(payments)
    }
}

#[async_trait]
impl TransferStore for InMemoryStore {
    async fn commit_transfer(
        &self,
        payer: &AccountId,
        receiver: &AccountId,
        amount: Amount,
        date: DateTime<Utc>,
    ) -> Result<Payment> {
        if payer == receiver {
            return Err(StoreError::CommitRejected("payer and receiver must differ"));
        }
        let mut inner = self.inner.write().await;

        // Compute both new balances before touching anything, so a refusal
        // leaves the maps untouched.
        let payer_balance = inner
            .accounts
            .get(payer)
            .ok_or(StoreError::CommitRejected("payer account missing"))?
            .balance
            .checked_debit(amount)
            .ok_or(StoreError::CommitRejected("debit would overdraw payer"))?;
        let receiver_balance = inner
            .accounts
            .get(receiver)
            .ok_or(StoreError::CommitRejected("receiver account missing"))?
            .balance
            .credit(amount);

        let id = inner.next_payment_id;
        inner.next_payment_id += 1;
        let payment = Payment {
            id,
            amount,
            payer: payer.clone(),
            receiver: receiver.clone(),
            date,
            method: PaymentMethod::Transfer,
        };

        if let Some(account) = inner.accounts.get_mut(payer) {
            account.balance = payer_balance;
        }
        if let Some(account) = inner.accounts.get_mut(receiver) {
            account.balance = receiver_balance;
        }
        inner.payments.push(payment.clone());
        Ok(payment)
    }
}
