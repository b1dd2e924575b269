//! Income distribution and withdrawals.

pub mod distributor;

#[cfg(test)]
mod distributor_props;

pub use distributor::{Distribution, IncomeDistributor};
