//! Observable listing state changes.

use chrono::{DateTime, Utc};
use millow_shared::types::{Address, Amount, AssetId};
use serde::{Deserialize, Serialize};

/// A committed change to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ListingEvent {
    /// The seller placed the asset in escrow.
    Listed {
        /// The listing seller.
        seller: Address,
        /// Price to be funded.
        purchase_price: Amount,
    },
    /// A deposit was recorded.
    Contributed {
        /// The depositing party.
        contributor: Address,
        /// Deposit size.
        amount: Amount,
    },
    /// Contributions reached the purchase price and shares were fixed.
    FundingComplete,
    /// The inspector recorded a result.
    InspectionSet {
        /// Whether the property passed.
        passed: bool,
    },
    /// A required party signed off.
    Approved {
        /// The approving party.
        party: Address,
    },
    /// Ownership moved to the shareholders and the seller was paid.
    Finalized {
        /// Shared-ownership holder now recorded in the registry.
        owner: Address,
    },
    /// Income was split across shareholders.
    IncomeDistributed {
        /// Income deposited by the payer.
        amount: Amount,
        /// Total credited to shareholders in this round.
        credited: Amount,
        /// Dust carried to the next round.
        remainder: Amount,
    },
    /// A shareholder pulled their credited income.
    Withdrawn {
        /// The withdrawing party.
        party: Address,
        /// Amount paid out.
        amount: Amount,
    },
    /// The seller withdrew the listing and contributors were refunded.
    Cancelled {
        /// Total refunded to contributors.
        refunded: Amount,
    },
}

impl ListingEvent {
    /// Returns the event name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Listed { .. } => "listed",
            Self::Contributed { .. } => "contributed",
            Self::FundingComplete => "funding_complete",
            Self::InspectionSet { .. } => "inspection_set",
            Self::Approved { .. } => "approved",
            Self::Finalized { .. } => "finalized",
            Self::IncomeDistributed { .. } => "income_distributed",
            Self::Withdrawn { .. } => "withdrawn",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Event stamped with its listing and commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// The listing the event belongs to.
    pub asset_id: AssetId,
    /// What happened.
    #[serde(flatten)]
    pub event: ListingEvent,
    /// When the change was committed.
    pub at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Wraps `event` for `asset_id` with the given commit time.
    #[must_use]
    pub fn new(asset_id: AssetId, event: ListingEvent, at: DateTime<Utc>) -> Self {
        Self {
            asset_id,
            event,
            at,
        }
    }
}
