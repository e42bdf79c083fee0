use super::account::{AccountId, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification tag on a ledger entry. Engine-initiated transfers always
/// record `Transfer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Transfer,
}

/// A completed transfer, as recorded in the append-only ledger.
///
/// Immutable once appended: there is no update or delete path. `date` is the
/// commit instant assigned inside the atomic unit, never client-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Monotonically assigned by the ledger store.
    pub id: u64,
    pub amount: Amount,
    pub payer: AccountId,
    pub receiver: AccountId,
    pub date: DateTime<Utc>,
    pub method: PaymentMethod,
}
