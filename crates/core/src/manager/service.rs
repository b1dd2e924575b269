//! Listing manager: the entry point callers use.
//!
//! Every listing sits behind its own mutex. A mutating call locks the listing,
//! runs the domain service on a draft copy, performs collaborator effects and
//! only then swaps the draft in and publishes the produced events. Calls on
//! different assets never contend.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use millow_shared::config::EscrowConfig;
use millow_shared::types::{Address, Amount, AssetId, BasisPoints};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::approval::ApprovalGate;
use crate::collaborator::{AssetRegistry, CollaboratorError, Treasury, move_funds};
use crate::contribution::ContributionLedger;
use crate::distribution::{Distribution, IncomeDistributor};
use crate::error::EscrowError;
use crate::listing::{EventEnvelope, Listing, ListingEvent, ListingRequest, ListingStatus};
use crate::settlement::{SettlementContext, SettlementEngine};

type Transition<T> = Result<(T, Vec<ListingEvent>), EscrowError>;

/// Serialized façade over every listing.
pub struct ListingManager {
    listings: DashMap<AssetId, Arc<Mutex<Listing>>>,
    archive: DashMap<AssetId, Vec<Listing>>,
    listing_gates: DashMap<AssetId, Arc<Mutex<()>>>,
    registry: Arc<dyn AssetRegistry>,
    treasury: Arc<dyn Treasury>,
    custody: Address,
    events: broadcast::Sender<EventEnvelope>,
}

impl ListingManager {
    /// Creates a manager wired to the given collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<dyn AssetRegistry>,
        treasury: Arc<dyn Treasury>,
        config: &EscrowConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            listings: DashMap::new(),
            archive: DashMap::new(),
            listing_gates: DashMap::new(),
            registry,
            treasury,
            custody: config.custody_address.clone(),
            events,
        }
    }

    /// Account holding listed assets and escrowed funds.
    #[must_use]
    pub fn custody(&self) -> &Address {
        &self.custody
    }

    /// Subscribes to committed listing events.
    ///
    /// Events of one listing arrive in commit order.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    /// Places an asset in escrow and opens it for funding.
    ///
    /// The asset moves from the seller to custody when the seller still owns
    /// it. A cancelled listing for the same asset is archived and replaced.
    ///
    /// # Errors
    /// * `EscrowError::InvalidListing` if the price or threshold is invalid
    /// * `EscrowError::ListingExists` if an active or settled listing exists
    /// * `EscrowError::Collaborator` if neither seller nor custody owns the asset
    pub fn list_property(&self, request: &ListingRequest) -> Result<(), EscrowError> {
        let asset_id = request.asset_id;
        let at = Utc::now();
        let mut listing = Listing::new(request, at)?;
        let envelope = EventEnvelope::new(
            asset_id,
            ListingEvent::Listed {
                seller: request.seller.clone(),
                purchase_price: request.purchase_price,
            },
            at,
        );
        listing.history.push(envelope.clone());

        // Listing calls for one asset serialize on this gate, never on the map
        let gate = Arc::clone(self.listing_gates.entry(asset_id).or_default().value());
        let _gate = gate.lock().unwrap_or_else(PoisonError::into_inner);

        // Only a listing call moves a record out of vacant or Cancelled, so
        // the check holds for as long as the gate does.
        let previous = match self.entry(asset_id) {
            Ok(existing) => {
                let current = existing.lock().unwrap_or_else(PoisonError::into_inner);
                if current.status != ListingStatus::Cancelled {
                    return Err(EscrowError::ListingExists(asset_id));
                }
                Some(current.clone())
            }
            Err(_) => None,
        };

        self.take_custody(request)?;

        // Locked until Listed is out, so no call on this asset publishes ahead of it
        let slot = Arc::new(Mutex::new(listing));
        let committed = slot.lock().unwrap_or_else(PoisonError::into_inner);
        self.listings.insert(asset_id, Arc::clone(&slot));
        if let Some(previous) = previous {
            debug!(asset_id = %asset_id, "Archived cancelled listing");
            self.archive.entry(asset_id).or_default().push(previous);
        }
        self.publish(envelope);
        drop(committed);

        info!(
            asset_id = %asset_id,
            seller = %request.seller,
            purchase_price = %request.purchase_price,
            "Property listed"
        );
        Ok(())
    }

    /// Records a deposit and pulls the funds into custody.
    ///
    /// # Returns
    /// The listing status after the deposit.
    pub fn contribute(
        &self,
        asset_id: AssetId,
        contributor: &Address,
        amount: Amount,
    ) -> Result<ListingStatus, EscrowError> {
        self.apply(asset_id, "contribute", |draft| {
            let events = ContributionLedger::contribute(draft, contributor, amount)?;
            move_funds(self.treasury.as_ref(), contributor, &self.custody, amount)?;
            Ok((draft.status, events))
        })
    }

    /// Records the inspector's verdict.
    pub fn set_inspection(
        &self,
        asset_id: AssetId,
        caller: &Address,
        passed: bool,
    ) -> Result<(), EscrowError> {
        self.apply(asset_id, "set inspection", |draft| {
            ApprovalGate::set_inspection(draft, caller, passed).map(|events| ((), events))
        })
    }

    /// Records a required party's sign-off.
    pub fn approve(&self, asset_id: AssetId, caller: &Address) -> Result<(), EscrowError> {
        self.apply(asset_id, "approve", |draft| {
            ApprovalGate::approve(draft, caller).map(|events| ((), events))
        })
    }

    /// Returns true if the listing can be finalized.
    pub fn is_ready(&self, asset_id: AssetId) -> Result<bool, EscrowError> {
        self.read(asset_id, ApprovalGate::is_ready)
    }

    /// Settles a ready listing. Any party may trigger settlement.
    ///
    /// # Returns
    /// The shared-ownership holder now recorded in the registry.
    pub fn finalize(&self, asset_id: AssetId, caller: &Address) -> Result<Address, EscrowError> {
        debug!(asset_id = %asset_id, caller = %caller, "Finalize requested");
        self.apply(asset_id, "finalize", |draft| {
            let events = SettlementEngine::finalize(draft, self.settlement_context(), Utc::now())?;
            let holder = SettlementEngine::ownership_holder(asset_id);
            Ok((holder, events))
        })
    }

    /// Withdraws an unsettled listing and refunds every contributor.
    ///
    /// # Returns
    /// The total refunded.
    pub fn cancel(&self, asset_id: AssetId, caller: &Address) -> Result<Amount, EscrowError> {
        self.apply(asset_id, "cancel", |draft| {
            SettlementEngine::cancel(draft, caller, self.settlement_context())
        })
    }

    /// Pulls `amount` from `payer` and splits it across the shareholders.
    pub fn distribute_income(
        &self,
        asset_id: AssetId,
        payer: &Address,
        amount: Amount,
    ) -> Result<Distribution, EscrowError> {
        self.apply(asset_id, "distribute income", |draft| {
            let (distribution, events) = IncomeDistributor::distribute(draft, amount)?;
            move_funds(self.treasury.as_ref(), payer, &self.custody, amount)?;
            debug!(
                asset_id = %asset_id,
                payer = %payer,
                credited = %distribution.total_credited(),
                remainder = %distribution.remainder,
                "Income split"
            );
            Ok((distribution, events))
        })
    }

    /// Pays out `caller`'s credited income.
    ///
    /// # Returns
    /// The amount paid.
    pub fn withdraw(&self, asset_id: AssetId, caller: &Address) -> Result<Amount, EscrowError> {
        self.apply(asset_id, "withdraw", |draft| {
            let (amount, events) = IncomeDistributor::withdraw(draft, caller)?;
            move_funds(self.treasury.as_ref(), &self.custody, caller, amount)?;
            Ok((amount, events))
        })
    }

    /// Returns a snapshot of the listing.
    pub fn listing(&self, asset_id: AssetId) -> Result<Listing, EscrowError> {
        self.read(asset_id, Listing::clone)
    }

    /// Returns the listing status.
    pub fn status(&self, asset_id: AssetId) -> Result<ListingStatus, EscrowError> {
        self.read(asset_id, |listing| listing.status)
    }

    /// Returns the deposit and basis-point share of `party`.
    pub fn contribution_of(
        &self,
        asset_id: AssetId,
        party: &Address,
    ) -> Result<(Amount, BasisPoints), EscrowError> {
        self.read(asset_id, |listing| {
            (listing.contribution_of(party), listing.share_of(party))
        })
    }

    /// Returns the withdrawable income of `party`.
    pub fn balance_of(&self, asset_id: AssetId, party: &Address) -> Result<Amount, EscrowError> {
        self.read(asset_id, |listing| listing.balance_of(party))
    }

    /// Returns the cancelled listings replaced by relisting, oldest first.
    #[must_use]
    pub fn archived(&self, asset_id: AssetId) -> Vec<Listing> {
        self.archive
            .get(&asset_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn settlement_context(&self) -> SettlementContext<'_> {
        SettlementContext {
            registry: self.registry.as_ref(),
            treasury: self.treasury.as_ref(),
            custody: &self.custody,
        }
    }

    fn take_custody(&self, request: &ListingRequest) -> Result<(), EscrowError> {
        let owner = self.registry.owner_of(request.asset_id)?;
        if owner == self.custody {
            return Ok(());
        }
        if owner != request.seller {
            warn!(
                asset_id = %request.asset_id,
                seller = %request.seller,
                owner = %owner,
                "Seller does not own the asset"
            );
            return Err(CollaboratorError::Authorization {
                asset_id: request.asset_id,
                caller: request.seller.clone(),
            }
            .into());
        }
        self.registry
            .transfer_ownership(request.asset_id, &request.seller, &self.custody)?;
        Ok(())
    }

    fn entry(&self, asset_id: AssetId) -> Result<Arc<Mutex<Listing>>, EscrowError> {
        self.listings
            .get(&asset_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EscrowError::ListingNotFound(asset_id))
    }

    fn read<T>(&self, asset_id: AssetId, f: impl FnOnce(&Listing) -> T) -> Result<T, EscrowError> {
        let entry = self.entry(asset_id)?;
        let listing = entry.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&listing))
    }

    /// Runs `transition` on a draft and commits it only if it succeeds.
    fn apply<T>(
        &self,
        asset_id: AssetId,
        operation: &'static str,
        transition: impl FnOnce(&mut Listing) -> Transition<T>,
    ) -> Result<T, EscrowError> {
        let entry = self.entry(asset_id)?;
        let mut listing = entry.lock().unwrap_or_else(PoisonError::into_inner);
        let mut draft = listing.clone();

        let (value, events) = match transition(&mut draft) {
            Ok(result) => result,
            Err(err) => {
                if matches!(err, EscrowError::Collaborator(_)) {
                    warn!(asset_id = %asset_id, operation, code = err.error_code(), error = %err, "Collaborator refused");
                } else {
                    debug!(asset_id = %asset_id, operation, code = err.error_code(), error = %err, "Rejected");
                }
                return Err(err);
            }
        };

        let at = Utc::now();
        let envelopes: Vec<EventEnvelope> = events
            .into_iter()
            .map(|event| EventEnvelope::new(asset_id, event, at))
            .collect();
        draft.history.extend(envelopes.iter().cloned());
        *listing = draft;

        if !envelopes.is_empty() {
            info!(
                asset_id = %asset_id,
                operation,
                status = %listing.status,
                events = envelopes.len(),
                "Listing updated"
            );
        }
        // Published under the lock so subscribers see commit order
        for envelope in envelopes {
            self.publish(envelope);
        }

        Ok(value)
    }

    fn publish(&self, envelope: EventEnvelope) {
        debug!(asset_id = %envelope.asset_id, event = envelope.event.name(), "Publishing event");
        // No receivers is not an error
        let _ = self.events.send(envelope);
    }
}
