//! Shared types and configuration for Millow.
//!
//! This crate provides common types used across all other crates:
//! - Integer money and basis-point types (no floating point anywhere)
//! - Typed identifiers for assets and parties
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
