//! Inspection and sign-off gate.
//!
//! This module implements the authorization checks for approvals and the
//! readiness query that settlement depends on.

use millow_shared::types::Address;

use crate::error::EscrowError;
use crate::listing::{Listing, ListingEvent, ListingStatus, Role};

/// Stateless gate evaluating and recording sign-offs.
pub struct ApprovalGate;

/// Roles whose holders may be asked to sign off.
const SIGNER_ROLES: [Role; 3] = [Role::Seller, Role::Lender, Role::Contributor];

impl ApprovalGate {
    /// Records `caller`'s approval.
    ///
    /// Re-approving is a no-op and produces no event.
    ///
    /// # Errors
    /// * `EscrowError::InvalidState` if the listing is not awaiting review
    /// * `EscrowError::UnauthorizedCaller` if `caller` holds no signing role or
    ///   is a contributor without a share
    pub fn approve(
        listing: &mut Listing,
        caller: &Address,
    ) -> Result<Vec<ListingEvent>, EscrowError> {
        Self::require_review(listing, "approve")?;
        listing.roles.require_any(caller, &SIGNER_ROLES, "approve")?;

        // Signers frozen at full funding; zero-share contributors are excluded
        if !listing.required_approvers.contains(caller) {
            return Err(EscrowError::UnauthorizedCaller {
                caller: caller.clone(),
                operation: "approve",
            });
        }

        if !listing.approvals.insert(caller.clone()) {
            return Ok(Vec::new());
        }

        Ok(vec![ListingEvent::Approved {
            party: caller.clone(),
        }])
    }

    /// Records the inspection result. The latest result wins.
    ///
    /// A failed inspection blocks settlement but does not cancel the listing.
    ///
    /// # Errors
    /// * `EscrowError::UnauthorizedCaller` if `caller` is not the inspector
    /// * `EscrowError::InvalidState` if the listing is not awaiting review
    pub fn set_inspection(
        listing: &mut Listing,
        caller: &Address,
        passed: bool,
    ) -> Result<Vec<ListingEvent>, EscrowError> {
        listing
            .roles
            .require(caller, Role::Inspector, "set inspection")?;
        Self::require_review(listing, "set inspection")?;

        listing.inspection_passed = passed;
        Ok(vec![ListingEvent::InspectionSet { passed }])
    }

    /// Returns true iff inspection passed and every required approver signed off.
    #[must_use]
    pub fn is_ready(listing: &Listing) -> bool {
        listing.inspection_passed
            && !listing.required_approvers.is_empty()
            && listing.approvals.is_superset(&listing.required_approvers)
    }

    /// Fails with `NotReady` unless `is_ready` holds.
    pub fn require_ready(listing: &Listing) -> Result<(), EscrowError> {
        if Self::is_ready(listing) {
            return Ok(());
        }
        Err(EscrowError::NotReady {
            asset_id: listing.asset_id,
            inspection_passed: listing.inspection_passed,
            missing_approvals: listing.missing_approvals().len(),
        })
    }

    fn require_review(listing: &Listing, operation: &'static str) -> Result<(), EscrowError> {
        match listing.status {
            ListingStatus::ReadyForReview => Ok(()),
            status => Err(EscrowError::InvalidState { operation, status }),
        }
    }
}
