//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::model::Points;
use crate::storage::StorageError;

/// Top-level error returned by the mutating [`Ledger`](super::Ledger)
/// operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("purchase rejected: {0}")]
    Purchase(#[from] PurchaseError),

    #[error("grant rejected: {0}")]
    Grant(#[from] GrantError),

    #[error("redemption rejected: {0}")]
    Redemption(#[from] RedemptionError),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("amount {0} is not positive")]
    NonPositiveAmount(Amount),
    #[error("spend total overflow")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum GrantError {
    #[error("grant of {0} points is not positive")]
    NonPositive(i64),
    #[error("balance overflow: current {current}, requested {requested}")]
    Overflow { current: Points, requested: Points },
}

#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("redemption of {0} points is not positive")]
    NonPositive(i64),
    #[error("insufficient points: available {available}, requested {requested}")]
    InsufficientPoints { available: Points, requested: Points },
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Storage(StorageError::Encode(e))
    }
}
