//! Atomic settlement and seller cancellation.
//!
//! Both operations touch two collaborators. Each external step that has
//! already succeeded is reversed when a later step fails, so callers observe
//! either the whole transition or none of it.

use chrono::{DateTime, Utc};
use millow_shared::types::{Address, Amount, AssetId};
use tracing::{error, warn};

use crate::approval::ApprovalGate;
use crate::collaborator::{AssetRegistry, Treasury, move_funds};
use crate::error::EscrowError;
use crate::listing::{Contribution, Listing, ListingEvent, ListingStatus, OwnershipRecord, Role};

/// Collaborators and custody account used during settlement.
#[derive(Clone, Copy)]
pub struct SettlementContext<'a> {
    /// Asset ownership registry.
    pub registry: &'a dyn AssetRegistry,
    /// Currency movement primitives.
    pub treasury: &'a dyn Treasury,
    /// Account holding listed assets and escrowed funds.
    pub custody: &'a Address,
}

/// Stateless settlement service.
pub struct SettlementEngine;

impl SettlementEngine {
    /// Registry owner representing the shareholders of a settled asset.
    #[must_use]
    pub fn ownership_holder(asset_id: AssetId) -> Address {
        Address::new(format!("fractional:{asset_id}"))
    }

    /// Settles a ready listing.
    ///
    /// Transfers the asset from custody to the shared-ownership holder, pays
    /// the seller the purchase price and locks the listing. Any party may
    /// trigger settlement once the gate is satisfied.
    ///
    /// # Errors
    /// * `EscrowError::AlreadyFinalized` on a second call
    /// * `EscrowError::InvalidState` if the listing is not awaiting review
    /// * `EscrowError::NotReady` if inspection or approvals are missing
    /// * `EscrowError::Collaborator` if the registry or treasury refuses
    pub fn finalize(
        listing: &mut Listing,
        ctx: SettlementContext<'_>,
        settled_at: DateTime<Utc>,
    ) -> Result<Vec<ListingEvent>, EscrowError> {
        match listing.status {
            ListingStatus::ReadyForReview => {}
            ListingStatus::Finalized => return Err(EscrowError::AlreadyFinalized(listing.asset_id)),
            status => {
                return Err(EscrowError::InvalidState {
                    operation: "finalize",
                    status,
                });
            }
        }
        ApprovalGate::require_ready(listing)?;

        let holder = Self::ownership_holder(listing.asset_id);
        ctx.registry
            .transfer_ownership(listing.asset_id, ctx.custody, &holder)?;

        if let Err(err) = move_funds(
            ctx.treasury,
            ctx.custody,
            &listing.seller,
            listing.purchase_price,
        ) {
            warn!(
                asset_id = %listing.asset_id,
                error = %err,
                "Seller payment failed, returning asset to custody"
            );
            Self::return_asset(ctx, listing.asset_id, &holder, ctx.custody);
            return Err(err.into());
        }

        listing.ownership = Some(OwnershipRecord {
            holder: holder.clone(),
            shares: listing.shares.clone(),
            settled_at,
        });
        listing.status = ListingStatus::Finalized;

        Ok(vec![ListingEvent::Finalized { owner: holder }])
    }

    /// Withdraws a listing before settlement.
    ///
    /// Returns the asset to the seller and refunds every contribution exactly.
    ///
    /// # Returns
    /// The total refunded and the produced events.
    ///
    /// # Errors
    /// * `EscrowError::UnauthorizedCaller` if `caller` is not the seller
    /// * `EscrowError::AlreadyFinalized` if the listing has settled
    /// * `EscrowError::InvalidState` if the listing is already cancelled
    /// * `EscrowError::Collaborator` if a transfer or refund fails
    pub fn cancel(
        listing: &mut Listing,
        caller: &Address,
        ctx: SettlementContext<'_>,
    ) -> Result<(Amount, Vec<ListingEvent>), EscrowError> {
        listing.roles.require(caller, Role::Seller, "cancel")?;
        match listing.status {
            ListingStatus::Finalized => return Err(EscrowError::AlreadyFinalized(listing.asset_id)),
            status if !status.is_cancellable() => {
                return Err(EscrowError::InvalidState {
                    operation: "cancel",
                    status,
                });
            }
            _ => {}
        }

        let mut refunded = Amount::ZERO;
        for c in &listing.contributions {
            refunded = refunded
                .checked_add(c.amount)
                .ok_or(EscrowError::ArithmeticOverflow("refund total"))?;
        }
        debug_assert_eq!(refunded, listing.total_contributed);

        ctx.registry
            .transfer_ownership(listing.asset_id, ctx.custody, &listing.seller)?;

        let mut paid: Vec<&Contribution> = Vec::with_capacity(listing.contributions.len());
        for c in &listing.contributions {
            if let Err(err) = move_funds(ctx.treasury, ctx.custody, &c.contributor, c.amount) {
                warn!(
                    asset_id = %listing.asset_id,
                    contributor = %c.contributor,
                    error = %err,
                    "Refund failed, reversing cancellation"
                );
                Self::claw_back(ctx, listing.asset_id, &paid);
                Self::return_asset(ctx, listing.asset_id, &listing.seller, ctx.custody);
                return Err(err.into());
            }
            paid.push(c);
        }

        listing.status = ListingStatus::Cancelled;
        Ok((refunded, vec![ListingEvent::Cancelled { refunded }]))
    }

    fn return_asset(ctx: SettlementContext<'_>, asset_id: AssetId, from: &Address, to: &Address) {
        if let Err(err) = ctx.registry.transfer_ownership(asset_id, from, to) {
            error!(
                asset_id = %asset_id,
                from = %from,
                to = %to,
                error = %err,
                "Failed to reverse asset transfer"
            );
        }
    }

    fn claw_back(ctx: SettlementContext<'_>, asset_id: AssetId, paid: &[&Contribution]) {
        for c in paid {
            if let Err(err) = move_funds(ctx.treasury, &c.contributor, ctx.custody, c.amount) {
                error!(
                    asset_id = %asset_id,
                    contributor = %c.contributor,
                    amount = %c.amount,
                    error = %err,
                    "Failed to reclaim refund"
                );
            }
        }
    }
}
