//! Property-based tests for contribution recording.
//!
//! - Share sum invariant: fully funded listings always total 10000 bps
//! - Over-funding rejection leaves the listing untouched
//! - Remainder goes to the largest, earliest contributor

use chrono::Utc;
use millow_shared::types::{Address, Amount, AssetId, BasisPoints};
use proptest::prelude::*;

use super::ledger::ContributionLedger;
use crate::error::EscrowError;
use crate::listing::{Listing, ListingRequest, ListingStatus};

/// Strategy to generate 1-12 positive deposits with contributor indices.
fn deposits() -> impl Strategy<Value = Vec<(usize, u128)>> {
    prop::collection::vec((0usize..6, 1u128..1_000_000), 1..12)
}

fn listing(price: u128) -> Listing {
    Listing::new(
        &ListingRequest {
            asset_id: AssetId::new(1),
            seller: Address::new("seller"),
            purchase_price: Amount::new(price),
            escrow_threshold: Amount::ZERO,
            inspector: Address::new("inspector"),
            lender: Address::new("lender"),
        },
        Utc::now(),
    )
    .unwrap()
}

fn buyer(idx: usize) -> Address {
    Address::new(format!("buyer-{idx}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of valid deposits summing to the price, shares sum
    /// to exactly 10000 and the listing is ready for review.
    #[test]
    fn prop_shares_sum_to_total(deposits in deposits()) {
        let price: u128 = deposits.iter().map(|(_, amount)| amount).sum();
        let mut listing = listing(price);

        for (idx, amount) in &deposits {
            ContributionLedger::contribute(&mut listing, &buyer(*idx), Amount::new(*amount))
                .unwrap();
        }

        prop_assert_eq!(listing.status, ListingStatus::ReadyForReview);
        prop_assert_eq!(listing.total_contributed, Amount::new(price));
        prop_assert_eq!(listing.total_shares(), BasisPoints::TOTAL);
    }

    /// *For any* listing state, a deposit exceeding the remaining funding
    /// fails with `Overfunded` and changes nothing.
    #[test]
    fn prop_overfunding_leaves_state_unchanged(
        price in 2u128..1_000_000,
        first_pct in 0u128..100,
        excess in 1u128..1_000,
    ) {
        let mut listing = listing(price);
        let first = price * first_pct / 100;
        if first > 0 {
            ContributionLedger::contribute(&mut listing, &buyer(0), Amount::new(first)).unwrap();
        }
        let before = listing.clone();

        let attempt = price - first + excess;
        let result = ContributionLedger::contribute(&mut listing, &buyer(1), Amount::new(attempt));

        let is_overfunded = matches!(result, Err(EscrowError::Overfunded { .. }));
        prop_assert!(is_overfunded);
        prop_assert_eq!(listing, before);
    }

    /// *For any* funded listing, each share is within one remainder of its
    /// floored exact value, and only the largest earliest contributor gets more.
    #[test]
    fn prop_remainder_goes_to_largest_earliest(deposits in deposits()) {
        let price: u128 = deposits.iter().map(|(_, amount)| amount).sum();
        let mut listing = listing(price);
        for (idx, amount) in &deposits {
            ContributionLedger::contribute(&mut listing, &buyer(*idx), Amount::new(*amount))
                .unwrap();
        }

        let mut winner = &listing.contributions[0];
        for c in &listing.contributions[1..] {
            if c.amount > winner.amount {
                winner = c;
            }
        }

        for c in &listing.contributions {
            let floor = u32::try_from(c.amount.units() * 10_000 / price).unwrap();
            let share = listing.share_of(&c.contributor).value();
            if c.contributor == winner.contributor {
                prop_assert!(share >= floor);
            } else {
                prop_assert_eq!(share, floor);
            }
        }
    }
}
