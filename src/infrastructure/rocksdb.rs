use crate::domain::account::{Account, AccountId, Amount, Balance, NewAccount};
use crate::domain::payment::{Payment, PaymentMethod};
use crate::domain::ports::{AccountStore, PaymentLedger, TransferStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family for account rows, keyed by public account id.
pub const CF_ACCOUNTS: &str = "accounts";
/// Uniqueness index: username -> account id.
pub const CF_USERNAMES: &str = "usernames";
/// Uniqueness index: email -> account id.
pub const CF_EMAILS: &str = "emails";
/// Column family for ledger rows, keyed by big-endian payment id.
pub const CF_PAYMENTS: &str = "payments";
/// Id counters.
pub const CF_META: &str = "meta";

const KEY_NEXT_ACCOUNT_ID: &[u8] = b"next_account_id";
const KEY_NEXT_PAYMENT_ID: &[u8] = b"next_payment_id";

/// A persistent store implementation using RocksDB.
///
/// Rows are JSON-encoded. Multi-row mutations (account creation with its
/// uniqueness indexes, the transfer commit) go through a single `WriteBatch`,
/// which RocksDB applies atomically, and a store-level writer mutex keeps the
/// read-modify-write sequences single-file.
///
/// `Clone` shares the underlying handle.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path, ensuring all
    /// required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_ACCOUNTS, CF_USERNAMES, CF_EMAILS, CF_PAYMENTS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or(StoreError::MissingColumnFamily(name))
    }

    fn load_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        let accounts = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(accounts, account_id.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        let meta = self.cf(CF_META)?;
        match self.db.get_cf(meta, key)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(1),
        }
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn create(&self, account: NewAccount) -> Result<Account> {
        let _write = self.write_lock.lock().await;
        let accounts = self.cf(CF_ACCOUNTS)?;
        let usernames = self.cf(CF_USERNAMES)?;
        let emails = self.cf(CF_EMAILS)?;
        let meta = self.cf(CF_META)?;

        if self
            .db
            .get_pinned_cf(accounts, account.account_id.as_str())?
            .is_some()
        {
            return Err(StoreError::DuplicateAccountId);
        }
        if self.db.get_pinned_cf(usernames, &account.username)?.is_some() {
            return Err(StoreError::DuplicateUsername);
        }
        if self.db.get_pinned_cf(emails, &account.email)?.is_some() {
            return Err(StoreError::DuplicateEmail);
        }

        let id = self.read_counter(KEY_NEXT_ACCOUNT_ID)?;
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

        let mut batch = WriteBatch::default();
        batch.put_cf(
            accounts,
            account.account_id.as_str(),
            serde_json::to_vec(&account)?,
        );
        batch.put_cf(usernames, &account.username, account.account_id.as_str());
        batch.put_cf(emails, &account.email, account.account_id.as_str());
        batch.put_cf(meta, KEY_NEXT_ACCOUNT_ID, serde_json::to_vec(&(id + 1))?);
        self.db.write(batch)?;

        Ok(account)
    }

    async fn find_by_account_id(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.load_account(account_id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let usernames = self.cf(CF_USERNAMES)?;
        let Some(bytes) = self.db.get_cf(usernames, username)? else {
            return Ok(None);
        };
        let account_id: AccountId = String::from_utf8_lossy(&bytes)
            .parse()
            .map_err(|_| StoreError::Corrupt("username index points at a malformed account id"))?;
        self.load_account(&account_id)
    }

    async fn set_balance(&self, account_id: &AccountId, balance: Balance) -> Result<Account> {
        let _write = self.write_lock.lock().await;
        let accounts = self.cf(CF_ACCOUNTS)?;

        let mut account = self
            .load_account(account_id)?
            .ok_or(StoreError::AccountNotFound)?;
        account.balance = balance;
        self.db
            .put_cf(accounts, account_id.as_str(), serde_json::to_vec(&account)?)?;
        Ok(account)
    }
}

#[async_trait]
impl PaymentLedger for RocksDbStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Payment>> {
        let payments = self.cf(CF_PAYMENTS)?;
        match self.db.get_cf(payments, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        from_year: Option<i32>,
    ) -> Result<Vec<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        let mut payments = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let payment: Payment = serde_json::from_slice(&value)?;
            let involved = payment.payer == *account_id || payment.receiver == *account_id;
            let in_range = from_year.is_none_or(|year| payment.date.year() >= year);
            if involved && in_range {
                payments.push(payment);
            }
        }
        payments.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(payments)
    }
}

#[async_trait]
impl TransferStore for RocksDbStore {
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
        let _write = self.write_lock.lock().await;
        let accounts = self.cf(CF_ACCOUNTS)?;
        let payments = self.cf(CF_PAYMENTS)?;
        let meta = self.cf(CF_META)?;

        let mut payer_account = self
            .load_account(payer)?
            .ok_or(StoreError::CommitRejected("payer account missing"))?;
        let mut receiver_account = self
            .load_account(receiver)?
            .ok_or(StoreError::CommitRejected("receiver account missing"))?;

        payer_account.balance = payer_account
            .balance
            .checked_debit(amount)
            .ok_or(StoreError::CommitRejected("debit would overdraw payer"))?;
        receiver_account.balance = receiver_account.balance.credit(amount);

        let id = self.read_counter(KEY_NEXT_PAYMENT_ID)?;
        let payment = Payment {
            id,
            amount,
            payer: payer.clone(),
            receiver: receiver.clone(),
            date,
            method: PaymentMethod::Transfer,
        };

        // One batch: both balances, the ledger row, and the counter land
        // together or not at all.
        let mut batch = WriteBatch::default();
        batch.put_cf(accounts, payer.as_str(), serde_json::to_vec(&payer_account)?);
        batch.put_cf(
            accounts,
            receiver.as_str(),
            serde_json::to_vec(&receiver_account)?,
        );
        batch.put_cf(payments, id.to_be_bytes(), serde_json::to_vec(&payment)?);
        batch.put_cf(meta, KEY_NEXT_PAYMENT_ID, serde_json::to_vec(&(id + 1))?);
        self.db.write(batch)?;

        Ok(payment)
    }
}
