use crate::error::{AccountError, InvalidAccountId, TransferError};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the public account id.
pub const ACCOUNT_ID_LEN: usize = 10;

const ACCOUNT_ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Public transfer address of an account: ten uppercase alphanumeric
/// characters, distinct from the internal numeric identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Draws a fresh id uniformly from `A-Z0-9`. Uniqueness is the caller's
    /// concern; registration retries on collision.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let id = (0..ACCOUNT_ID_LEN)
            .map(|_| ACCOUNT_ID_CHARS[rng.gen_range(0..ACCOUNT_ID_CHARS.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = InvalidAccountId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == ACCOUNT_ID_LEN
            && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if well_formed {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidAccountId)
        }
    }
}

impl TryFrom<String> for AccountId {
    type Error = InvalidAccountId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True if the value carries more than two meaningful decimal places.
fn exceeds_cents(value: Decimal) -> bool {
    value.normalize().scale() > 2
}

/// A positive monetary amount with at most two decimal places.
///
/// Wraps `rust_decimal::Decimal` so transfer amounts are validated once, at
/// the boundary, and stay fixed-point everywhere after. Binary floating
/// point never enters the money path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, TransferError> {
        if value > Decimal::ZERO && !exceeds_cents(value) {
            Ok(Self(value))
        } else {
            Err(TransferError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = TransferError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A non-negative account balance, two-decimal fixed point.
///
/// The debit path is checked: a balance refuses to go negative rather than
/// relying on callers to test first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, AccountError> {
        if value >= Decimal::ZERO && !exceeds_cents(value) {
            Ok(Self(value))
        } else {
            Err(AccountError::InvalidBalance)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The balance after debiting `amount`, or `None` if that would overdraw.
    pub fn checked_debit(self, amount: Amount) -> Option<Self> {
        if self.0 >= amount.value() {
            Some(Self(self.0 - amount.value()))
        } else {
            None
        }
    }

    pub fn credit(self, amount: Amount) -> Self {
        Self(self.0 + amount.value())
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = AccountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user account.
///
/// `balance` is mutated only by the transfer engine's atomic commit or the
/// administrative balance update; it never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Internal identity assigned by the store.
    pub id: u64,
    /// Public transfer address.
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; never exposed through the API.
    pub password_hash: String,
    pub balance: Balance,
    pub date_joined: DateTime<Utc>,
    /// Inactive accounts resolve as unknown everywhere.
    pub is_active: bool,
}

/// Input to `AccountStore::create`; the store assigns the internal id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub balance: Balance,
    pub date_joined: DateTime<Utc>,
}
