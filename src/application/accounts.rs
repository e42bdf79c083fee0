use crate::domain::account::{Account, AccountId, Balance, NewAccount};
use crate::domain::ports::AccountStoreBox;
use crate::error::{AccountError, StoreError};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use rust_decimal::Decimal;

/// Attempts at drawing an unused account id before giving up. With 36^10
/// possible ids a second draw is already rare.
const ACCOUNT_ID_ATTEMPTS: usize = 16;

/// Registration, authentication, and administrative account operations.
///
/// Balance mutation here is limited to the administrative overwrite; the
/// transfer path belongs to `TransferEngine`.
pub struct AccountService {
    store: AccountStoreBox,
    starting_balance: Balance,
}

impl AccountService {
    pub fn new(store: AccountStoreBox, starting_balance: Balance) -> Self {
        Self {
            store,
            starting_balance,
        }
    }

    /// Registers a new user account with a freshly generated public id and
    /// the configured starting balance.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || username.len() > 50 {
            return Err(AccountError::InvalidField(
                "username must be between 1 and 50 characters",
            ));
        }
        if email.is_empty() || email.len() > 100 || !email.contains('@') {
            return Err(AccountError::InvalidField("email must be a valid address"));
        }
        if password.len() < 8 {
            return Err(AccountError::InvalidField(
                "password must be at least 8 characters",
            ));
        }

        let password_hash = hash_password(password)?;

        let mut last = StoreError::DuplicateAccountId;
        for _ in 0..ACCOUNT_ID_ATTEMPTS {
            let new_account = NewAccount {
                account_id: AccountId::generate(&mut rand::thread_rng()),
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: password_hash.clone(),
                balance: self.starting_balance,
                date_joined: Utc::now(),
            };
            match self.store.create(new_account).await {
                Ok(account) => {
                    tracing::info!(account_id = %account.account_id, "account registered");
                    return Ok(account);
                }
                // Id collision: draw again.
                Err(err @ StoreError::DuplicateAccountId) => last = err,
                Err(StoreError::DuplicateUsername) => return Err(AccountError::UsernameTaken),
                Err(StoreError::DuplicateEmail) => return Err(AccountError::EmailTaken),
                Err(err) => return Err(err.into()),
            }
        }
        Err(AccountError::Store(last))
    }

    /// Verifies credentials. Unknown users and wrong passwords collapse into
    /// one error so the response does not reveal which part was wrong.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let account = self
            .store
            .find_by_username(username)
            .await?
            .filter(|account| account.is_active)
            .ok_or(AccountError::InvalidCredentials)?;
        verify_password(password, &account.password_hash)?;
        Ok(account)
    }

    /// Recipient lookup used by callers before sending money. The transfer
    /// engine re-resolves both accounts inside its atomic commit, so this
    /// read carries no correctness weight.
    pub async fn find_by_account_id(&self, account_id: &AccountId) -> Result<Account, AccountError> {
        self.store
            .find_by_account_id(account_id)
            .await?
            .filter(|account| account.is_active)
            .ok_or(AccountError::UnknownAccount)
    }

    /// Administrative balance overwrite, outside the transfer path.
    pub async fn set_balance(
        &self,
        account_id: &AccountId,
        balance: Decimal,
    ) -> Result<Account, AccountError> {
        let balance = Balance::new(balance)?;
        match self.store.set_balance(account_id, balance).await {
            Ok(account) => {
                tracing::info!(%account_id, %balance, "balance updated");
                Ok(account)
            }
            Err(StoreError::AccountNotFound) => Err(AccountError::UnknownAccount),
            Err(err) => Err(err.into()),
        }
    }
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::PasswordHash(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<(), AccountError> {
    let parsed = PasswordHash::new(hash).map_err(|err| AccountError::PasswordHash(err.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AccountError::InvalidCredentials)
}
