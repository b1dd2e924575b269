//! Per-listing serialized façade over the escrow services.

pub mod service;


pub use service::ListingManager;
