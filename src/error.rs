use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Raised when a string does not have the shape of a public account id.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("account ids are ten uppercase alphanumeric characters")]
pub struct InvalidAccountId;

/// Failures raised by storage backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("account id already exists")]
    DuplicateAccountId,
    #[error("username already exists")]
    DuplicateUsername,
    #[error("email already exists")]
    DuplicateEmail,
    #[error("account not found")]
    AccountNotFound,
    /// The atomic transfer unit was refused as a whole; nothing was written.
    #[error("commit rejected: {0}")]
    CommitRejected(&'static str),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt stored row: {0}")]
    Corrupt(&'static str),
    #[cfg(feature = "storage-rocksdb")]
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("column family {0} not found")]
    MissingColumnFamily(&'static str),
}

/// Outcome taxonomy of the transfer engine.
///
/// The first five variants are validation failures: expected, reported before
/// any state change, and recoverable by the caller. `CommitFailed` signals a
/// storage failure during the atomic unit; the contract guarantees no partial
/// mutation occurred, so the caller may retry the whole call.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("sender account not found")]
    UnknownSender,
    #[error("receiver account not found")]
    UnknownReceiver,
    #[error("sender and receiver accounts must differ")]
    SelfTransfer,
    #[error("amount must be positive with at most two decimal places")]
    InvalidAmount,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("transfer commit failed: {0}")]
    CommitFailed(#[from] StoreError),
}

impl TransferError {
    /// Stable machine-readable code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownSender => "unknown_sender",
            Self::UnknownReceiver => "unknown_receiver",
            Self::SelfTransfer => "self_transfer",
            Self::InvalidAmount => "invalid_amount",
            Self::InsufficientBalance => "insufficient_balance",
            Self::CommitFailed(_) => "commit_failed",
        }
    }
}

/// Failures of the account service (registration, authentication,
/// administrative updates).
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already taken")]
    EmailTaken,
    #[error("{0}")]
    InvalidField(&'static str),
    #[error("account not found")]
    UnknownAccount,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("balance must be non-negative with at most two decimal places")]
    InvalidBalance,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountError {
    /// Stable machine-readable code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UsernameTaken => "username_taken",
            Self::EmailTaken => "email_taken",
            Self::InvalidField(_) => "invalid_field",
            Self::UnknownAccount => "unknown_account",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidBalance => "invalid_balance",
            Self::PasswordHash(_) => "internal_error",
            Self::Store(_) => "storage_error",
        }
    }
}
