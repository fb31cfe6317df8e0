use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Every failure the ledger engine and its stores can surface.
///
/// Variants up to `Timeout` are deterministic outcomes a caller can map to a
/// user-facing status. `Timeout` guarantees the operation did not commit.
/// The remaining variants are infrastructure faults.
#[derive(Error, Diagnostic, Debug)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    #[diagnostic(code(coinshop::invalid_amount))]
    InvalidAmount(i64),

    #[error("account name must be non-empty")]
    #[diagnostic(code(coinshop::invalid_name))]
    InvalidName,

    #[error("cannot transfer coins from `{0}` to itself")]
    #[diagnostic(code(coinshop::self_transfer))]
    SelfTransfer(String),

    #[error("account `{0}` not found")]
    #[diagnostic(code(coinshop::account_not_found))]
    AccountNotFound(String),

    #[error("item `{0}` not found in catalog")]
    #[diagnostic(code(coinshop::item_not_found))]
    ItemNotFound(String),

    #[error("insufficient funds in `{name}`: balance {balance}, requested {requested}")]
    #[diagnostic(code(coinshop::insufficient_funds))]
    InsufficientFunds {
        name: String,
        balance: u64,
        requested: u64,
    },

    #[error("account `{0}` already exists")]
    #[diagnostic(code(coinshop::already_exists))]
    AlreadyExists(String),

    #[error("invalid username or password")]
    #[diagnostic(code(coinshop::unauthorized))]
    Unauthorized,

    #[error("malformed operation: {0}")]
    #[diagnostic(code(coinshop::malformed_operation))]
    MalformedOperation(String),

    #[error("operation timed out after {0:?} without committing")]
    #[diagnostic(code(coinshop::timeout))]
    Timeout(Duration),

    #[error("CSV error: {0}")]
    #[diagnostic(code(coinshop::csv))]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(coinshop::io))]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    #[diagnostic(code(coinshop::serialization))]
    SerializationError(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    #[diagnostic(code(coinshop::internal))]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into().into())
    }

    /// True for faults of the storage or transport layer rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::CsvError(_)
                | Self::IoError(_)
                | Self::SerializationError(_)
                | Self::InternalError(_)
        )
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

impl From<tokio::task::JoinError> for LedgerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::InternalError(Box::new(err))
    }
}
