//! Deposit recording against a listing.

use std::collections::BTreeSet;

use millow_shared::types::{Address, Amount};

use super::shares::ShareAllocator;
use crate::error::EscrowError;
use crate::listing::{Contribution, Listing, ListingEvent, ListingStatus, Role};

/// Stateless service recording contributions on a listing.
///
/// Operates on a draft listing; the caller commits or discards it. Every
/// derived value is computed before the first write so a rejected call never
/// leaves the draft half-updated.
pub struct ContributionLedger;

impl ContributionLedger {
    /// Records a deposit of `amount` by `contributor`.
    ///
    /// # Returns
    /// The events produced: `Contributed`, plus `FundingComplete` when the
    /// deposit brings funding to exactly the purchase price.
    ///
    /// # Errors
    /// * `EscrowError::InvalidState` if the listing no longer accepts deposits
    /// * `EscrowError::InvalidAmount` if `amount` is zero
    /// * `EscrowError::Overfunded` if funding would exceed the purchase price
    pub fn contribute(
        listing: &mut Listing,
        contributor: &Address,
        amount: Amount,
    ) -> Result<Vec<ListingEvent>, EscrowError> {
        if !listing.status.accepts_contributions() {
            return Err(EscrowError::InvalidState {
                operation: "contribute",
                status: listing.status,
            });
        }
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }

        let new_total = listing
            .total_contributed
            .checked_add(amount)
            .ok_or(EscrowError::ArithmeticOverflow("total contributed"))?;
        if new_total > listing.purchase_price {
            return Err(EscrowError::Overfunded {
                attempted: amount,
                remaining: listing.remaining_funding(),
            });
        }

        let mut contributions = listing.contributions.clone();
        match contributions
            .iter_mut()
            .find(|c| &c.contributor == contributor)
        {
            Some(existing) => {
                existing.amount = existing
                    .amount
                    .checked_add(amount)
                    .ok_or(EscrowError::ArithmeticOverflow("contribution"))?;
            }
            None => contributions.push(Contribution {
                contributor: contributor.clone(),
                amount,
            }),
        }

        let funded = new_total == listing.purchase_price;
        let shares = if funded {
            Some(ShareAllocator::allocate(&contributions, listing.purchase_price)?)
        } else {
            None
        };

        // Commit to the draft
        listing.contributions = contributions;
        listing.total_contributed = new_total;
        listing.roles.grant(contributor, Role::Contributor);
        listing.status = ListingStatus::Funding;

        let mut events = vec![ListingEvent::Contributed {
            contributor: contributor.clone(),
            amount,
        }];

        if let Some(shares) = shares {
            listing.shares = shares.into_iter().collect();
            listing.required_approvers = Self::required_approvers(listing);
            listing.status = ListingStatus::ReadyForReview;
            events.push(ListingEvent::FundingComplete);
        }

        Ok(events)
    }

    /// Seller, lender and every contributor with a non-zero share.
    fn required_approvers(listing: &Listing) -> BTreeSet<Address> {
        let mut approvers: BTreeSet<Address> = listing
            .roles
            .holders(Role::Seller)
            .chain(listing.roles.holders(Role::Lender))
            .cloned()
            .collect();
        approvers.extend(listing.shareholders().map(|(address, _)| address.clone()));
        approvers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use millow_shared::types::{AssetId, BasisPoints};

    use crate::listing::ListingRequest;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn listing(price: u128) -> Listing {
        Listing::new(
            &ListingRequest {
                asset_id: AssetId::new(1),
                seller: addr("seller"),
                purchase_price: Amount::new(price),
                escrow_threshold: Amount::new(2),
                inspector: addr("inspector"),
                lender: addr("lender"),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_first_contribution_moves_to_funding() {
        let mut listing = listing(10);
        let events =
            ContributionLedger::contribute(&mut listing, &addr("a"), Amount::new(4)).unwrap();
        assert_eq!(listing.status, ListingStatus::Funding);
        assert_eq!(listing.total_contributed, Amount::new(4));
        assert!(listing.meets_escrow_threshold());
        assert!(listing.shares.is_empty());
        assert_eq!(
            events,
            vec![ListingEvent::Contributed {
                contributor: addr("a"),
                amount: Amount::new(4)
            }]
        );
    }

    #[test]
    fn test_repeat_deposits_merge() {
        let mut listing = listing(10);
        ContributionLedger::contribute(&mut listing, &addr("a"), Amount::new(2)).unwrap();
        ContributionLedger::contribute(&mut listing, &addr("b"), Amount::new(3)).unwrap();
        ContributionLedger::contribute(&mut listing, &addr("a"), Amount::new(1)).unwrap();
        assert_eq!(listing.contributions.len(), 2);
        assert_eq!(listing.contribution_of(&addr("a")), Amount::new(3));
        assert_eq!(listing.contributions[0].contributor, addr("a"));
    }

    #[test]
    fn test_full_funding_computes_shares_and_approvers() {
        let mut listing = listing(10);
        ContributionLedger::contribute(&mut listing, &addr("a"), Amount::new(4)).unwrap();
        let events =
            ContributionLedger::contribute(&mut listing, &addr("b"), Amount::new(6)).unwrap();

        assert_eq!(listing.status, ListingStatus::ReadyForReview);
        assert_eq!(listing.share_of(&addr("a")), BasisPoints::new(4000));
        assert_eq!(listing.share_of(&addr("b")), BasisPoints::new(6000));
        assert_eq!(listing.total_shares(), BasisPoints::TOTAL);
        assert_eq!(
            listing.required_approvers.iter().cloned().collect::<Vec<_>>(),
            vec![addr("a"), addr("b"), addr("lender"), addr("seller")]
        );
        assert_eq!(events.last(), Some(&ListingEvent::FundingComplete));
    }

    #[test]
    fn test_zero_share_contributor_is_not_an_approver() {
        let mut listing = listing(100_000);
        ContributionLedger::contribute(&mut listing, &addr("whale"), Amount::new(99_999)).unwrap();
        ContributionLedger::contribute(&mut listing, &addr("minnow"), Amount::new(1)).unwrap();
        assert_eq!(listing.share_of(&addr("minnow")), BasisPoints::ZERO);
        assert!(!listing.required_approvers.contains(&addr("minnow")));
        assert!(listing.required_approvers.contains(&addr("whale")));
    }

    #[test]
    fn test_overfunding_rejected_without_change() {
        let mut listing = listing(10);
        ContributionLedger::contribute(&mut listing, &addr("a"), Amount::new(7)).unwrap();
        let before = listing.clone();
        let result = ContributionLedger::contribute(&mut listing, &addr("b"), Amount::new(4));
        assert_eq!(
            result,
            Err(EscrowError::Overfunded {
                attempted: Amount::new(4),
                remaining: Amount::new(3)
            })
        );
        assert_eq!(listing, before);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut listing = listing(10);
        assert_eq!(
            ContributionLedger::contribute(&mut listing, &addr("a"), Amount::ZERO),
            Err(EscrowError::InvalidAmount)
        );
        assert_eq!(listing.status, ListingStatus::Listed);
    }

    #[test]
    fn test_contribution_after_full_funding_rejected() {
        let mut listing = listing(10);
        ContributionLedger::contribute(&mut listing, &addr("a"), Amount::new(10)).unwrap();
        let before = listing.clone();
        let result = ContributionLedger::contribute(&mut listing, &addr("b"), Amount::new(1));
        assert_eq!(
            result,
            Err(EscrowError::InvalidState {
                operation: "contribute",
                status: ListingStatus::ReadyForReview
            })
        );
        assert_eq!(listing, before);
    }
}
