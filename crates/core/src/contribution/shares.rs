//! Basis-point share allocation.
//!
//! Shares are computed once, when funding reaches the purchase price:
//! 1. Floor each contributor's exact share of 10000 basis points
//! 2. Sum the floors
//! 3. Give the leftover basis points to the single largest contributor
//!    (ties go to the earliest first deposit)
//!
//! The result always sums to exactly 10000 without arbitrary-precision math.

use millow_shared::types::{Address, Amount, BasisPoints};

use crate::error::EscrowError;
use crate::listing::Contribution;

/// Stateless share allocator.
pub struct ShareAllocator;

impl ShareAllocator {
    /// Computes basis-point shares for contributions that fully fund `price`.
    ///
    /// # Arguments
    ///
    /// * `contributions` - Contributions in first-deposit order
    /// * `price` - The purchase price; must equal the sum of contributions
    ///
    /// # Returns
    ///
    /// One share per contribution, in the same order, summing to 10000.
    ///
    /// # Errors
    ///
    /// Returns `EscrowError::ArithmeticOverflow` if an intermediate product
    /// overflows, or `EscrowError::InvalidAmount` for an empty or zero-priced
    /// allocation.
    pub fn allocate(
        contributions: &[Contribution],
        price: Amount,
    ) -> Result<Vec<(Address, BasisPoints)>, EscrowError> {
        if contributions.is_empty() || price.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }

        let total = u128::from(BasisPoints::TOTAL);

        // Round down each
        let mut floors = Vec::with_capacity(contributions.len());
        for c in contributions {
            let bps = c
                .amount
                .mul_div_floor(total, price.units())
                .ok_or(EscrowError::ArithmeticOverflow("shares"))?;
            let bps = u32::try_from(bps.units())
                .map_err(|_| EscrowError::ArithmeticOverflow("shares"))?;
            floors.push(bps);
        }

        let allocated: u32 = floors.iter().sum();
        let remainder = BasisPoints::TOTAL
            .checked_sub(allocated)
            .ok_or(EscrowError::ArithmeticOverflow("shares"))?;

        // Largest contribution wins the remainder; strict `>` keeps the earliest on ties
        let mut largest = 0;
        for (idx, c) in contributions.iter().enumerate().skip(1) {
            if c.amount > contributions[largest].amount {
                largest = idx;
            }
        }
        floors[largest] += remainder;

        Ok(contributions
            .iter()
            .zip(floors)
            .map(|(c, bps)| (c.contributor.clone(), BasisPoints::new(bps)))
            .collect())
    }
}
