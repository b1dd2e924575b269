//! The per-asset escrow record.
//!
//! # Modules
//!
//! - `types` - Listing record and lifecycle status
//! - `roles` - Per-listing authorization table
//! - `event` - Observable state changes

pub mod event;
pub mod roles;
pub mod types;

pub use event::{EventEnvelope, ListingEvent};
pub use roles::{AuthorizationTable, Role};
pub use types::{Contribution, Listing, ListingRequest, ListingStatus, OwnershipRecord};
