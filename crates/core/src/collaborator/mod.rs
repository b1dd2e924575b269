//! Contracts for the systems the escrow core depends on.
//!
//! - `registry` - Asset ownership lookup and transfer
//! - `treasury` - Atomic currency credit and debit
//! - `error` - Failures reported by either collaborator

pub mod error;
pub mod registry;
pub mod treasury;

pub use error::CollaboratorError;
pub use registry::{AssetRegistry, InMemoryRegistry};
pub use treasury::{InMemoryTreasury, Treasury, move_funds};

#[cfg(test)]
pub use registry::MockAssetRegistry;
#[cfg(test)]
pub use treasury::MockTreasury;
