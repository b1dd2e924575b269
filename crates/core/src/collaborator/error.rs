//! Errors reported by external collaborators.

use millow_shared::types::{Address, Amount, AssetId};
use thiserror::Error;

/// Failures bubbled up from the asset registry or the treasury.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// Caller is not the current owner of the asset.
    #[error("{caller} is not authorized to transfer asset {asset_id}")]
    Authorization {
        /// The asset being transferred.
        asset_id: AssetId,
        /// The party that attempted the transfer.
        caller: Address,
    },

    /// The registry has no record of the asset.
    #[error("Asset {0} is not registered")]
    UnknownAsset(AssetId),

    /// Debit exceeds the available balance.
    #[error("Insufficient funds for {address}: requested {requested}, available {available}")]
    InsufficientFunds {
        /// The account being debited.
        address: Address,
        /// The requested amount.
        requested: Amount,
        /// The balance available.
        available: Amount,
    },

    /// Credit would overflow the account balance.
    #[error("Balance overflow for {0}")]
    BalanceOverflow(Address),

    /// The collaborator could not be reached or refused the call.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Authorization { .. } => "AUTHORIZATION_ERROR",
            Self::UnknownAsset(_) => "UNKNOWN_ASSET",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::Unavailable(_) => "COLLABORATOR_UNAVAILABLE",
        }
    }
}
