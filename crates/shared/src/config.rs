//! Application configuration management.

use serde::Deserialize;

use crate::types::Address;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Escrow engine configuration.
    #[serde(default)]
    pub escrow: EscrowConfig,
    /// Default parties wired into new listings.
    #[serde(default)]
    pub parties: PartiesConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Escrow engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EscrowConfig {
    /// Address that holds listed assets and escrowed funds.
    #[serde(default = "default_custody_address")]
    pub custody_address: Address,
    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_custody_address() -> Address {
    Address::new("escrow")
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            custody_address: default_custody_address(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Default parties for a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PartiesConfig {
    /// Seller who lists the property.
    #[serde(default = "default_seller")]
    pub seller: Address,
    /// Designated inspector.
    #[serde(default = "default_inspector")]
    pub inspector: Address,
    /// Designated lender.
    #[serde(default = "default_lender")]
    pub lender: Address,
}

fn default_seller() -> Address {
    Address::new("seller")
}

fn default_inspector() -> Address {
    Address::new("inspector")
}

fn default_lender() -> Address {
    Address::new("lender")
}

impl Default for PartiesConfig {
    fn default() -> Self {
        Self {
            seller: default_seller(),
            inspector: default_inspector(),
            lender: default_lender(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "millow=debug,millow_core=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `MILLOW__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MILLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
