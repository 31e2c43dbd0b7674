//! Runtime configuration, read from the environment (and `.env` when present).

use std::net::SocketAddr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::tracking::DEFAULT_STAGE_INTERVAL;

pub const BIND_ADDR: &str = "BIND_ADDR";
pub const STAGE_INTERVAL_SECS: &str = "STAGE_INTERVAL_SECS";
pub const DEFAULT_DELIVERY_FEE: &str = "DEFAULT_DELIVERY_FEE";

#[derive(Debug, thiserror::Error)]
#[error("Invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Time between two simulated delivery stages
    pub stage_interval: Duration,

    /// Fee charged when a checkout request does not carry one
    pub default_delivery_fee: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            stage_interval: DEFAULT_STAGE_INTERVAL,
            default_delivery_fee: Decimal::new(1000, 2),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(BIND_ADDR) {
            config.bind_addr = value
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid(BIND_ADDR, &value, e))?;
        }

        if let Some(value) = lookup(STAGE_INTERVAL_SECS) {
            let secs: u64 = value
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(STAGE_INTERVAL_SECS, &value, e))?;
            if secs == 0 {
                return Err(invalid(STAGE_INTERVAL_SECS, &value, "must be greater than zero"));
            }
            config.stage_interval = Duration::from_secs(secs);
        }

        if let Some(value) = lookup(DEFAULT_DELIVERY_FEE) {
            let fee: Decimal = value
                .parse()
                .map_err(|e: rust_decimal::Error| invalid(DEFAULT_DELIVERY_FEE, &value, e))?;
            if fee < Decimal::ZERO {
                return Err(invalid(DEFAULT_DELIVERY_FEE, &value, "cannot be negative"));
            }
            config.default_delivery_fee = fee;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
