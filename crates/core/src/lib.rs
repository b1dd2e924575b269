//! Core escrow logic for Millow.
//!
//! This crate contains the fractional-purchase state machine with ZERO web or
//! database dependencies. Asset ownership and currency movement are reached
//! only through the collaborator traits.
//!
//! # Modules
//!
//! - `listing` - Listing record, status, roles and events
//! - `contribution` - Deposits and basis-point share computation
//! - `approval` - Inspection and sign-off gate
//! - `settlement` - Atomic finalize and seller cancellation
//! - `distribution` - Proportional income split and withdrawals
//! - `manager` - Per-listing serialized façade used by callers
//! - `collaborator` - Asset registry and treasury contracts

pub mod approval;
pub mod collaborator;
pub mod contribution;
pub mod distribution;
pub mod error;
pub mod listing;
pub mod manager;
pub mod settlement;

pub use error::EscrowError;
pub use manager::ListingManager;
