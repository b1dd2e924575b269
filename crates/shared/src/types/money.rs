//! Integer money and basis-point types.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are counted in the smallest currency unit (e.g. wei) as `u128`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A currency amount in the smallest indivisible unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from smallest units.
    #[must_use]
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// Returns the raw number of smallest units.
    #[must_use]
    pub const fn units(self) -> u128 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction. Returns `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Computes `floor(self * numerator / denominator)`.
    ///
    /// Returns `None` if the intermediate product overflows or the
    /// denominator is zero.
    #[must_use]
    pub fn mul_div_floor(self, numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        self.0.checked_mul(numerator).map(|p| Self(p / denominator))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|a| a.0).sum())
    }
}

/// A proportional share expressed in basis points (1/100 of a percent).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BasisPoints(pub u32);

impl BasisPoints {
    /// Basis points making up a whole (100%).
    pub const TOTAL: u32 = 10_000;

    /// Zero share.
    pub const ZERO: Self = Self(0);

    /// Creates a share from raw basis points.
    #[must_use]
    pub const fn new(bps: u32) -> Self {
        Self(bps)
    }

    /// Returns the raw basis points.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns true if the share is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns the share as an exact percentage (4000 bps = 40.00).
    #[must_use]
    pub fn as_percent(self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl std::fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bps", self.0)
    }
}
