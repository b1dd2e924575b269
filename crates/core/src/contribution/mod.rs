//! Contribution tracking and share computation.
//!
//! - `ledger` - Validates and records deposits on a listing
//! - `shares` - Basis-point allocation with largest-contributor remainder

pub mod ledger;
pub mod shares;

#[cfg(test)]
mod ledger_props;

pub use ledger::ContributionLedger;
pub use shares::ShareAllocator;
