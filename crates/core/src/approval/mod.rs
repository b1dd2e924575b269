//! Approval gate: inspection result, required sign-offs, readiness.

pub mod gate;

pub use gate::ApprovalGate;
