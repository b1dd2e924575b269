//! Property-based tests for income distribution.
//!
//! - Conservation: credited balances plus the carried remainder always equal
//!   the income deposited
//! - Remainder stays below the number of shareholders

use chrono::Utc;
use millow_shared::types::{Address, Amount, AssetId};
use proptest::prelude::*;

use super::distributor::IncomeDistributor;
use crate::contribution::ShareAllocator;
use crate::listing::{Contribution, Listing, ListingRequest, ListingStatus};

/// Strategy to generate 1-8 positive contributions.
fn contributions() -> impl Strategy<Value = Vec<u128>> {
    prop::collection::vec(1u128..100_000, 1..8)
}

/// Strategy to generate 1-20 income rounds.
fn incomes() -> impl Strategy<Value = Vec<u128>> {
    prop::collection::vec(1u128..1_000_000, 1..20)
}

fn finalized_listing(amounts: &[u128]) -> Listing {
    let price: u128 = amounts.iter().sum();
    let mut listing = Listing::new(
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
    .unwrap();

    let contributions: Vec<Contribution> = amounts
        .iter()
        .enumerate()
        .map(|(idx, amount)| Contribution {
            contributor: Address::new(format!("holder-{idx}")),
            amount: Amount::new(*amount),
        })
        .collect();
    listing.shares = ShareAllocator::allocate(&contributions, Amount::new(price))
        .unwrap()
        .into_iter()
        .collect();
    listing.contributions = contributions;
    listing.total_contributed = Amount::new(price);
    listing.status = ListingStatus::Finalized;
    listing
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* share table and income sequence, Σ credited + remainder
    /// equals Σ income after every round.
    #[test]
    fn prop_income_is_conserved(amounts in contributions(), incomes in incomes()) {
        let mut listing = finalized_listing(&amounts);
        let mut deposited = 0u128;

        for income in incomes {
            IncomeDistributor::distribute(&mut listing, Amount::new(income)).unwrap();
            deposited += income;

            let balances: u128 = listing.balances.values().map(|a| a.units()).sum();
            prop_assert_eq!(balances + listing.undistributed_remainder.units(), deposited);
            prop_assert_eq!(listing.total_income, Amount::new(deposited));
            prop_assert_eq!(listing.total_credited.units(), balances);
        }
    }

    /// *For any* round, the carried remainder is smaller than the number of
    /// shareholders.
    #[test]
    fn prop_remainder_below_shareholder_count(amounts in contributions(), incomes in incomes()) {
        let mut listing = finalized_listing(&amounts);
        let holders = u128::try_from(listing.shareholders().count()).unwrap();

        for income in incomes {
            let (round, _) = IncomeDistributor::distribute(&mut listing, Amount::new(income)).unwrap();
            prop_assert!(round.remainder.units() < holders);
        }
    }

    /// *For any* sequence, withdrawing everything leaves only the remainder
    /// undistributed.
    #[test]
    fn prop_withdrawals_drain_balances(amounts in contributions(), incomes in incomes()) {
        let mut listing = finalized_listing(&amounts);
        let total: u128 = incomes.iter().sum();
        for income in incomes {
            IncomeDistributor::distribute(&mut listing, Amount::new(income)).unwrap();
        }

        let parties: Vec<Address> = listing.balances.keys().cloned().collect();
        let mut paid = 0u128;
        for party in parties {
            let (amount, _) = IncomeDistributor::withdraw(&mut listing, &party).unwrap();
            paid += amount.units();
        }

        prop_assert!(listing.balances.is_empty());
        prop_assert_eq!(paid + listing.undistributed_remainder.units(), total);
    }
}
