use std::collections::HashSet;

use alloy::primitives::Address;
use thiserror::Error;

use fortius_safe_core::{DecoderConfig, DEFAULT_DELEGATION_TARGET};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub safe_service_base_url: String,
    pub safe_service_timeout_ms: u64,
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    pub safe_version: String,
    pub timelock_module_address: Option<Address>,
    pub multisend_address: Address,
    pub delegation_targets: HashSet<Address>,
    pub trailing_records_to_drop: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            safe_service_base_url: "https://safe-transaction-mainnet.safe.global".to_owned(),
            safe_service_timeout_ms: 15_000,
            rpc_url: None,
            chain_id: 1,
            safe_version: "1.3.0".to_owned(),
            timelock_module_address: None,
            multisend_address: DEFAULT_DELEGATION_TARGET,
            delegation_targets: HashSet::from([DEFAULT_DELEGATION_TARGET]),
            trailing_records_to_drop: 3,
        }
    }
}

impl AdapterConfig {
    /// Defaults overridden by `FORTIUS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(url) = get("FORTIUS_SAFE_SERVICE_URL") {
            cfg.safe_service_base_url = url;
        }
        if let Some(raw) = get("FORTIUS_SAFE_TIMEOUT_MS") {
            cfg.safe_service_timeout_ms = parse("FORTIUS_SAFE_TIMEOUT_MS", &raw)?;
        }
        if let Some(url) = get("FORTIUS_RPC_URL") {
            cfg.rpc_url = Some(url);
        }
        if let Some(raw) = get("FORTIUS_CHAIN_ID") {
            cfg.chain_id = parse("FORTIUS_CHAIN_ID", &raw)?;
        }
        if let Some(version) = get("FORTIUS_SAFE_VERSION") {
            cfg.safe_version = version;
        }
        if let Some(raw) = get("FORTIUS_TIMELOCK_MODULE") {
            cfg.timelock_module_address = Some(parse("FORTIUS_TIMELOCK_MODULE", &raw)?);
        }
        if let Some(raw) = get("FORTIUS_MULTISEND_ADDRESS") {
            cfg.multisend_address = parse("FORTIUS_MULTISEND_ADDRESS", &raw)?;
        }
        if let Some(raw) = get("FORTIUS_DELEGATION_TARGETS") {
            cfg.delegation_targets = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse("FORTIUS_DELEGATION_TARGETS", s))
                .collect::<Result<_, _>>()?;
        }
        if let Some(raw) = get("FORTIUS_TRAILING_DROP") {
            cfg.trailing_records_to_drop = parse("FORTIUS_TRAILING_DROP", &raw)?;
        }

        Ok(cfg)
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            delegation_targets: self.delegation_targets.clone(),
            trailing_records_to_drop: self.trailing_records_to_drop,
            ..DecoderConfig::default()
        }
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
