//! Escrow error types.
//!
//! Every error describes a caller precondition violation or a collaborator
//! refusal. None of them is retried internally, and every operation that
//! returns one leaves the listing exactly as it was.

use millow_shared::types::{Address, Amount, AssetId};
use thiserror::Error;

use crate::collaborator::CollaboratorError;
use crate::listing::ListingStatus;

/// Errors that can occur during escrow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    // ========== Lookup Errors ==========
    /// No listing exists for the asset.
    #[error("No listing found for asset {0}")]
    ListingNotFound(AssetId),

    /// The asset already has an open or settled listing.
    #[error("Asset {0} is already listed")]
    ListingExists(AssetId),

    /// Listing parameters are inconsistent.
    #[error("Invalid listing: {0}")]
    InvalidListing(String),

    // ========== State Errors ==========
    /// Operation is not legal in the listing's current status.
    #[error("Cannot {operation} while listing is {status}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The listing's status at the time.
        status: ListingStatus,
    },

    /// Finalize attempted before inspection and approvals are complete.
    #[error("Listing {asset_id} is not ready: inspection passed = {inspection_passed}, {missing_approvals} approval(s) missing")]
    NotReady {
        /// The listing's asset.
        asset_id: AssetId,
        /// Whether the inspector has passed the property.
        inspection_passed: bool,
        /// Number of required approvers who have not signed off.
        missing_approvals: usize,
    },

    /// The listing has already been settled.
    #[error("Listing {0} is already finalized")]
    AlreadyFinalized(AssetId),

    // ========== Amount Errors ==========
    /// Amount must be greater than zero.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Contribution would push funding above the purchase price.
    #[error("Contribution of {attempted} exceeds remaining funding of {remaining}")]
    Overfunded {
        /// The rejected contribution.
        attempted: Amount,
        /// Funding still open on the listing.
        remaining: Amount,
    },

    /// Caller has no credited balance.
    #[error("{0} has nothing to withdraw")]
    NothingToWithdraw(Address),

    /// Integer arithmetic overflowed.
    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),

    // ========== Authorization Errors ==========
    /// Caller does not hold the role the operation requires.
    #[error("{caller} is not authorized to {operation}")]
    UnauthorizedCaller {
        /// The caller's address.
        caller: Address,
        /// The rejected operation.
        operation: &'static str,
    },

    // ========== Collaborator Errors ==========
    /// Asset registry or treasury refused the call.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl EscrowError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ListingNotFound(_) => "LISTING_NOT_FOUND",
            Self::ListingExists(_) => "LISTING_EXISTS",
            Self::InvalidListing(_) => "INVALID_LISTING",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::NotReady { .. } => "NOT_READY",
            Self::AlreadyFinalized(_) => "ALREADY_FINALIZED",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::Overfunded { .. } => "OVERFUNDED",
            Self::NothingToWithdraw(_) => "NOTHING_TO_WITHDRAW",
            Self::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
            Self::UnauthorizedCaller { .. } => "UNAUTHORIZED_CALLER",
            Self::Collaborator(inner) => inner.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidListing(_) | Self::InvalidAmount => 400,

            // 403 Forbidden - permission errors
            Self::UnauthorizedCaller { .. }
            | Self::Collaborator(CollaboratorError::Authorization { .. }) => 403,

            // 404 Not Found
            Self::ListingNotFound(_) | Self::Collaborator(CollaboratorError::UnknownAsset(_)) => {
                404
            }

            // 409 Conflict - lifecycle errors
            Self::ListingExists(_)
            | Self::InvalidState { .. }
            | Self::NotReady { .. }
            | Self::AlreadyFinalized(_) => 409,

            // 422 Unprocessable - funding rules
            Self::Overfunded { .. }
            | Self::NothingToWithdraw(_)
            | Self::Collaborator(CollaboratorError::InsufficientFunds { .. }) => 422,

            // 500 Internal Server Error
            Self::ArithmeticOverflow(_)
            | Self::Collaborator(
                CollaboratorError::BalanceOverflow(_) | CollaboratorError::Unavailable(_),
            ) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EscrowError::ListingNotFound(AssetId::new(1)), 404, "LISTING_NOT_FOUND")]
    #[case(EscrowError::ListingExists(AssetId::new(1)), 409, "LISTING_EXISTS")]
    #[case(EscrowError::InvalidAmount, 400, "INVALID_AMOUNT")]
    #[case(
        EscrowError::Overfunded { attempted: Amount::new(5), remaining: Amount::new(1) },
        422,
        "OVERFUNDED"
    )]
    #[case(EscrowError::AlreadyFinalized(AssetId::new(1)), 409, "ALREADY_FINALIZED")]
    #[case(
        EscrowError::NothingToWithdraw(Address::new("0xa")),
        422,
        "NOTHING_TO_WITHDRAW"
    )]
    #[case(
        EscrowError::UnauthorizedCaller { caller: Address::new("0xa"), operation: "approve" },
        403,
        "UNAUTHORIZED_CALLER"
    )]
    #[case(
        EscrowError::Collaborator(CollaboratorError::Authorization {
            asset_id: AssetId::new(1),
            caller: Address::new("0xa"),
        }),
        403,
        "AUTHORIZATION_ERROR"
    )]
    #[case(
        EscrowError::Collaborator(CollaboratorError::InsufficientFunds {
            address: Address::new("0xa"),
            requested: Amount::new(2),
            available: Amount::new(1),
        }),
        422,
        "INSUFFICIENT_FUNDS"
    )]
    #[case(EscrowError::ArithmeticOverflow("shares"), 500, "ARITHMETIC_OVERFLOW")]
    fn test_status_and_error_codes(
        #[case] err: EscrowError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_invalid_state_display() {
        let err = EscrowError::InvalidState {
            operation: "contribute",
            status: ListingStatus::Finalized,
        };
        assert_eq!(err.to_string(), "Cannot contribute while listing is finalized");
    }

    #[test]
    fn test_not_ready_display() {
        let err = EscrowError::NotReady {
            asset_id: AssetId::new(7),
            inspection_passed: false,
            missing_approvals: 2,
        };
        assert!(err.to_string().contains("inspection passed = false"));
        assert!(err.to_string().contains("2 approval(s) missing"));
    }
}
