//! Proportional income split with remainder carry.
//!
//! Each round splits `amount + carried remainder` by basis points, flooring
//! every credit. The dust stays in `undistributed_remainder` and joins the
//! next round, so across any sequence of rounds:
//!
//! ```text
//! Σ credited + remainder == Σ income
//! ```

use millow_shared::types::{Address, Amount, BasisPoints};

use crate::error::EscrowError;
use crate::listing::{Listing, ListingEvent, ListingStatus};

/// Result of one distribution round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// Credit per shareholder, in address order.
    pub credited: Vec<(Address, Amount)>,
    /// Dust carried to the next round.
    pub remainder: Amount,
}

impl Distribution {
    /// Sum credited in this round.
    #[must_use]
    pub fn total_credited(&self) -> Amount {
        self.credited.iter().map(|(_, amount)| *amount).sum()
    }
}

/// Stateless service splitting income and paying out balances.
pub struct IncomeDistributor;

impl IncomeDistributor {
    /// Splits `amount` across the shareholders of a finalized listing.
    ///
    /// # Errors
    /// * `EscrowError::InvalidState` if the listing is not finalized
    /// * `EscrowError::InvalidAmount` if `amount` is zero
    /// * `EscrowError::ArithmeticOverflow` if a running total overflows
    pub fn distribute(
        listing: &mut Listing,
        amount: Amount,
    ) -> Result<(Distribution, Vec<ListingEvent>), EscrowError> {
        if listing.status != ListingStatus::Finalized {
            return Err(EscrowError::InvalidState {
                operation: "distribute income",
                status: listing.status,
            });
        }
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }

        let pool = amount
            .checked_add(listing.undistributed_remainder)
            .ok_or(EscrowError::ArithmeticOverflow("income pool"))?;
        let total_income = listing
            .total_income
            .checked_add(amount)
            .ok_or(EscrowError::ArithmeticOverflow("total income"))?;

        let credited = Self::split(pool, listing.shareholders())?;
        let round_total: Amount = credited.iter().map(|(_, a)| *a).sum();
        let remainder = pool
            .checked_sub(round_total)
            .ok_or(EscrowError::ArithmeticOverflow("income remainder"))?;
        let total_credited = listing
            .total_credited
            .checked_add(round_total)
            .ok_or(EscrowError::ArithmeticOverflow("total credited"))?;

        let mut balances = listing.balances.clone();
        for (party, credit) in &credited {
            if credit.is_zero() {
                continue;
            }
            let balance = balances.entry(party.clone()).or_default();
            *balance = balance
                .checked_add(*credit)
                .ok_or(EscrowError::ArithmeticOverflow("shareholder balance"))?;
        }

        listing.balances = balances;
        listing.undistributed_remainder = remainder;
        listing.total_income = total_income;
        listing.total_credited = total_credited;

        let event = ListingEvent::IncomeDistributed {
            amount,
            credited: round_total,
            remainder,
        };
        Ok((
            Distribution {
                credited,
                remainder,
            },
            vec![event],
        ))
    }

    /// Zeroes `caller`'s balance and returns the amount to pay out.
    ///
    /// # Errors
    /// * `EscrowError::NothingToWithdraw` if the balance is zero
    pub fn withdraw(
        listing: &mut Listing,
        caller: &Address,
    ) -> Result<(Amount, Vec<ListingEvent>), EscrowError> {
        let amount = listing.balance_of(caller);
        if amount.is_zero() {
            return Err(EscrowError::NothingToWithdraw(caller.clone()));
        }

        listing.balances.remove(caller);
        Ok((
            amount,
            vec![ListingEvent::Withdrawn {
                party: caller.clone(),
                amount,
            }],
        ))
    }

    fn split<'a>(
        pool: Amount,
        shareholders: impl Iterator<Item = (&'a Address, BasisPoints)>,
    ) -> Result<Vec<(Address, Amount)>, EscrowError> {
        shareholders
            .map(|(party, bps)| {
                pool.mul_div_floor(u128::from(bps.value()), u128::from(BasisPoints::TOTAL))
                    .map(|credit| (party.clone(), credit))
                    .ok_or(EscrowError::ArithmeticOverflow("income share"))
            })
            .collect()
    }
}
