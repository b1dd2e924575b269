//! Millow lifecycle simulator.
//!
//! Wires the listing manager to in-memory collaborators and replays a full
//! fractional purchase: listing, two contributions, inspection, approvals,
//! settlement, two income rounds and withdrawals. Every committed event is
//! logged from the subscription channel.
//!
//! Usage: cargo run --bin millow-sim

use std::sync::Arc;

use millow_core::ListingManager;
use millow_core::collaborator::{InMemoryRegistry, InMemoryTreasury, Treasury};
use millow_core::listing::ListingRequest;
use millow_shared::AppConfig;
use millow_shared::types::{Address, Amount, AssetId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = Arc::new(InMemoryRegistry::new());
    let treasury = Arc::new(InMemoryTreasury::new());
    let manager = ListingManager::new(registry.clone(), treasury.clone(), &config.escrow);
    info!(custody = %manager.custody(), "Escrow ready");

    let mut events = manager.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => {
                    let payload = serde_json::to_string(&envelope).unwrap_or_default();
                    info!(
                        asset_id = %envelope.asset_id,
                        event = envelope.event.name(),
                        %payload,
                        "Event received"
                    );
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let parties = &config.parties;
    let asset_id = AssetId::new(1);
    let buyer_a = Address::new("buyer-a");
    let buyer_b = Address::new("buyer-b");
    let tenant = Address::new("tenant");

    registry.mint(asset_id, parties.seller.clone());
    treasury.credit(&buyer_a, Amount::new(4))?;
    treasury.credit(&buyer_b, Amount::new(6))?;
    treasury.credit(&tenant, Amount::new(4))?;

    manager.list_property(&ListingRequest {
        asset_id,
        seller: parties.seller.clone(),
        purchase_price: Amount::new(10),
        escrow_threshold: Amount::new(2),
        inspector: parties.inspector.clone(),
        lender: parties.lender.clone(),
    })?;

    manager.contribute(asset_id, &buyer_a, Amount::new(4))?;
    manager.contribute(asset_id, &buyer_b, Amount::new(6))?;
    for buyer in [&buyer_a, &buyer_b] {
        let (amount, share) = manager.contribution_of(asset_id, buyer)?;
        info!(buyer = %buyer, %amount, share = %share.as_percent(), "Share fixed");
    }

    manager.set_inspection(asset_id, &parties.inspector, true)?;
    for party in [&parties.seller, &parties.lender, &buyer_a, &buyer_b] {
        manager.approve(asset_id, party)?;
    }
    info!(ready = manager.is_ready(asset_id)?, "Approval gate evaluated");

    let holder = manager.finalize(asset_id, &buyer_a)?;
    info!(
        holder = %holder,
        seller_balance = %treasury.balance_of(&parties.seller),
        "Settled"
    );

    for round in 1..=2 {
        let distribution = manager.distribute_income(asset_id, &tenant, Amount::new(2))?;
        info!(
            round,
            credited = %distribution.total_credited(),
            remainder = %distribution.remainder,
            "Income distributed"
        );
    }

    for buyer in [&buyer_a, &buyer_b] {
        let paid = manager.withdraw(asset_id, buyer)?;
        info!(buyer = %buyer, %paid, wallet = %treasury.balance_of(buyer), "Withdrawn");
    }

    let listing = manager.listing(asset_id)?;
    drop(manager);
    event_log.await?;

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
