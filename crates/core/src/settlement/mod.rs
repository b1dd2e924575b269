//! Settlement: atomic finalize and seller cancellation with refund.

pub mod engine;

pub use engine::{SettlementContext, SettlementEngine};
