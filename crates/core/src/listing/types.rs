//! Listing record and lifecycle status.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use millow_shared::types::{Address, Amount, AssetId, BasisPoints};
use serde::{Deserialize, Serialize};

use super::event::EventEnvelope;
use super::roles::AuthorizationTable;
use crate::error::EscrowError;

/// Listing status in the escrow lifecycle.
///
/// The valid transitions are:
/// - Listed → Funding (first contribution)
/// - Listed/Funding → ReadyForReview (funding reaches the price)
/// - ReadyForReview → Finalized (settlement)
/// - Listed/Funding/ReadyForReview → Cancelled (seller withdrawal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Asset is in custody, no funds yet.
    Listed,
    /// At least one contribution recorded, price not yet reached.
    Funding,
    /// Fully funded; awaiting inspection and approvals.
    ReadyForReview,
    /// Settled; only income distribution remains (immutable otherwise).
    Finalized,
    /// Withdrawn by the seller and refunded (immutable).
    Cancelled,
}

impl ListingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listed => "listed",
            Self::Funding => "funding",
            Self::ReadyForReview => "ready_for_review",
            Self::Finalized => "finalized",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if deposits are accepted.
    #[must_use]
    pub fn accepts_contributions(&self) -> bool {
        matches!(self, Self::Listed | Self::Funding)
    }

    /// Returns true if the seller may still cancel.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Listed | Self::Funding | Self::ReadyForReview)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for listing an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRequest {
    /// The asset being sold.
    pub asset_id: AssetId,
    /// The party listing the asset.
    pub seller: Address,
    /// Total price contributors must fund.
    pub purchase_price: Amount,
    /// Informational earnest-deposit minimum.
    pub escrow_threshold: Amount,
    /// Designated inspector.
    pub inspector: Address,
    /// Designated lender.
    pub lender: Address,
}

/// Running balance of one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// The depositing party.
    pub contributor: Address,
    /// Sum of every deposit by this party.
    pub amount: Amount,
}

/// Shared-ownership record created at settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    /// Registry owner of the asset after settlement.
    pub holder: Address,
    /// Shares backing the holder, frozen at settlement.
    pub shares: BTreeMap<Address, BasisPoints>,
    /// When ownership moved.
    pub settled_at: DateTime<Utc>,
}

/// Escrow record for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// The asset being sold.
    pub asset_id: AssetId,
    /// The party that listed the asset and receives the price.
    pub seller: Address,
    /// Total price contributors must fund.
    pub purchase_price: Amount,
    /// Informational earnest-deposit minimum.
    pub escrow_threshold: Amount,
    /// Lifecycle status.
    pub status: ListingStatus,
    /// Role grants for this listing.
    pub roles: AuthorizationTable,
    /// Latest inspection result.
    pub inspection_passed: bool,
    /// Parties whose approval settlement needs; frozen when funding completes.
    pub required_approvers: BTreeSet<Address>,
    /// Parties that have approved.
    pub approvals: BTreeSet<Address>,
    /// Sum of all contributions.
    pub total_contributed: Amount,
    /// Contributions in first-deposit order.
    pub contributions: Vec<Contribution>,
    /// Basis-point shares, fixed when funding completes.
    pub shares: BTreeMap<Address, BasisPoints>,
    /// Income dust carried between distributions.
    pub undistributed_remainder: Amount,
    /// Sum of all income deposited.
    pub total_income: Amount,
    /// Sum of all income credited to shareholders.
    pub total_credited: Amount,
    /// Withdrawable income per shareholder.
    pub balances: BTreeMap<Address, Amount>,
    /// Set once the listing is finalized.
    pub ownership: Option<OwnershipRecord>,
    /// Audit trail of committed events.
    pub history: Vec<EventEnvelope>,
    /// When the listing was created.
    pub listed_at: DateTime<Utc>,
}

impl Listing {
    /// Creates a listing after validating the request.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::InvalidListing` if the price is zero, too large to
    /// split into basis-point shares, or below the escrow threshold.
    pub fn new(request: &ListingRequest, listed_at: DateTime<Utc>) -> Result<Self, EscrowError> {
        if request.purchase_price.is_zero() {
            return Err(EscrowError::InvalidListing(
                "purchase price must be greater than zero".to_string(),
            ));
        }
        // Share computation multiplies each contribution by 10000
        let max_price = Amount::new(u128::MAX / u128::from(BasisPoints::TOTAL));
        if request.purchase_price > max_price {
            return Err(EscrowError::InvalidListing(format!(
                "purchase price {} exceeds maximum {max_price}",
                request.purchase_price
            )));
        }
        if request.escrow_threshold > request.purchase_price {
            return Err(EscrowError::InvalidListing(format!(
                "escrow threshold {} exceeds purchase price {}",
                request.escrow_threshold, request.purchase_price
            )));
        }

        Ok(Self {
            asset_id: request.asset_id,
            seller: request.seller.clone(),
            purchase_price: request.purchase_price,
            escrow_threshold: request.escrow_threshold,
            status: ListingStatus::Listed,
            roles: AuthorizationTable::new(&request.seller, &request.inspector, &request.lender),
            inspection_passed: false,
            required_approvers: BTreeSet::new(),
            approvals: BTreeSet::new(),
            total_contributed: Amount::ZERO,
            contributions: Vec::new(),
            shares: BTreeMap::new(),
            undistributed_remainder: Amount::ZERO,
            total_income: Amount::ZERO,
            total_credited: Amount::ZERO,
            balances: BTreeMap::new(),
            ownership: None,
            history: Vec::new(),
            listed_at,
        })
    }

    /// Returns the recorded contribution of `party`.
    #[must_use]
    pub fn contribution_of(&self, party: &Address) -> Amount {
        self.contributions
            .iter()
            .find(|c| &c.contributor == party)
            .map_or(Amount::ZERO, |c| c.amount)
    }

    /// Returns the basis-point share of `party` (zero until funding completes).
    #[must_use]
    pub fn share_of(&self, party: &Address) -> BasisPoints {
        self.shares.get(party).copied().unwrap_or_default()
    }

    /// Returns the withdrawable income of `party`.
    #[must_use]
    pub fn balance_of(&self, party: &Address) -> Amount {
        self.balances.get(party).copied().unwrap_or_default()
    }

    /// Returns the funding still open.
    #[must_use]
    pub fn remaining_funding(&self) -> Amount {
        self.purchase_price
            .checked_sub(self.total_contributed)
            .unwrap_or_default()
    }

    /// Returns true once contributions reach the escrow threshold.
    #[must_use]
    pub fn meets_escrow_threshold(&self) -> bool {
        self.total_contributed >= self.escrow_threshold
    }

    /// Returns the shareholders that receive income (non-zero share).
    pub fn shareholders(&self) -> impl Iterator<Item = (&Address, BasisPoints)> {
        self.shares
            .iter()
            .filter(|(_, bps)| !bps.is_zero())
            .map(|(address, bps)| (address, *bps))
    }

    /// Returns the required approvers who have not yet approved.
    #[must_use]
    pub fn missing_approvals(&self) -> Vec<&Address> {
        self.required_approvers
            .difference(&self.approvals)
            .collect()
    }

    /// Returns the sum of all recorded shares in basis points.
    #[must_use]
    pub fn total_shares(&self) -> u32 {
        self.shares.values().map(|bps| bps.value()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ListingRequest {
        ListingRequest {
            asset_id: AssetId::new(1),
            seller: Address::new("seller"),
            purchase_price: Amount::new(10),
            escrow_threshold: Amount::new(2),
            inspector: Address::new("inspector"),
            lender: Address::new("lender"),
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ListingStatus::ReadyForReview.to_string(), "ready_for_review");
        assert_eq!(ListingStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_predicates() {
        assert!(ListingStatus::Listed.accepts_contributions());
        assert!(ListingStatus::Funding.accepts_contributions());
        assert!(!ListingStatus::ReadyForReview.accepts_contributions());
        assert!(ListingStatus::ReadyForReview.is_cancellable());
        assert!(!ListingStatus::Finalized.is_cancellable());
        assert!(!ListingStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_new_listing() {
        let listing = Listing::new(&request(), Utc::now()).unwrap();
        assert_eq!(listing.status, ListingStatus::Listed);
        assert_eq!(listing.seller, Address::new("seller"));
        assert_eq!(listing.remaining_funding(), Amount::new(10));
        assert!(!listing.meets_escrow_threshold());
        assert!(listing.history.is_empty());
    }

    #[test]
    fn test_new_listing_rejects_zero_price() {
        let mut req = request();
        req.purchase_price = Amount::ZERO;
        req.escrow_threshold = Amount::ZERO;
        assert!(matches!(
            Listing::new(&req, Utc::now()),
            Err(EscrowError::InvalidListing(_))
        ));
    }

    #[test]
    fn test_new_listing_price_limit() {
        let max = u128::MAX / 10_000;
        let mut req = request();
        req.purchase_price = Amount::new(max);
        assert!(Listing::new(&req, Utc::now()).is_ok());

        req.purchase_price = Amount::new(max + 1);
        assert!(matches!(
            Listing::new(&req, Utc::now()),
            Err(EscrowError::InvalidListing(_))
        ));
    }

    #[test]
    fn test_new_listing_rejects_threshold_above_price() {
        let mut req = request();
        req.escrow_threshold = Amount::new(11);
        assert!(matches!(
            Listing::new(&req, Utc::now()),
            Err(EscrowError::InvalidListing(_))
        ));
    }
}
