//! Calldata decoding for queued Safe transactions.
//!
//! Calls to a delegation target (the canonical MultiSend deployment by
//! default) or to the Safe itself are handed to the service's data decoder;
//! everything else is decoded locally against the [`SelectorRegistry`].

use std::collections::HashSet;

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::{address, hex, Address};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::domain::{
    ActionOutcome, DecodedAction, DecodedParam, HistoryFilter, ScheduleAction, SCHEDULE_ACTION,
};
use crate::multisend::{self, MULTISEND_SELECTOR};
use crate::ports::TxHistoryPort;
use crate::registry::SelectorRegistry;
use crate::remote::decode_via_service;
use crate::schedule::normalize_schedule;

/// MultiSend v1.3.0, the batching contract the Safe UI targets.
pub const DEFAULT_DELEGATION_TARGET: Address = address!("a238cbeb142c10ef7ad8442c6d1f9e89e07e7761");

pub const SCHEDULE_SELECTOR: &str = "0x6673bff6";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown function selector {0}")]
    UnknownSelector(String),
    #[error("calldata is not valid hex: {0}")]
    InvalidHex(String),
    #[error("calldata too short: {0} bytes")]
    TooShort(usize),
    #[error("abi decode for {selector} failed: {reason}")]
    Abi { selector: String, reason: String },
    #[error("malformed schedule arguments: {0}")]
    ScheduleShape(String),
    #[error("malformed multiSend payload: {0}")]
    MultiSend(String),
    #[error("selector {0} is not a timelock schedule")]
    NotSchedule(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    pub delegation_targets: HashSet<Address>,
    /// The all-transactions listing ends with entries that never belong in the queue view.
    pub trailing_records_to_drop: usize,
    pub history_filter: HistoryFilter,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            delegation_targets: HashSet::from([DEFAULT_DELEGATION_TARGET]),
            trailing_records_to_drop: 3,
            history_filter: HistoryFilter::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalldataDecoder {
    registry: SelectorRegistry,
    config: DecoderConfig,
}

impl Default for CalldataDecoder {
    fn default() -> Self {
        Self::new(SelectorRegistry::builtin().clone(), DecoderConfig::default())
    }
}

impl CalldataDecoder {
    pub fn new(registry: SelectorRegistry, config: DecoderConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn delegates(&self, account: Address, to: Address) -> bool {
        to == account || self.config.delegation_targets.contains(&to)
    }

    pub async fn decode<H: TxHistoryPort>(
        &self,
        service: &H,
        account: Address,
        to: Address,
        calldata: &str,
    ) -> ActionOutcome {
        if self.delegates(account, to) {
            return match decode_via_service(service, to, calldata).await {
                Some(action) => ActionOutcome::Decoded(DecodedAction::Remote(action)),
                None => ActionOutcome::unavailable("remote decoder unavailable"),
            };
        }

        match decode_local(&self.registry, calldata) {
            Ok(action) => ActionOutcome::Decoded(action),
            Err(e) => {
                warn!(%to, calldata, error = %e, "local calldata decode failed");
                ActionOutcome::unavailable(e.to_string())
            }
        }
    }
}

/// Decodes calldata against `registry` without touching the network.
pub fn decode_local(registry: &SelectorRegistry, calldata: &str) -> Result<DecodedAction, DecodeError> {
    let bytes = parse_calldata(calldata)?;
    let selector = hex::encode_prefixed(&bytes[..4]);
    let entry = registry
        .lookup(&selector)
        .ok_or_else(|| DecodeError::UnknownSelector(selector.clone()))?;

    let args = entry
        .function
        .abi_decode_input(&bytes[4..], true)
        .map_err(|e| DecodeError::Abi {
            selector: selector.clone(),
            reason: e.to_string(),
        })?;

    if entry.action_type == SCHEDULE_ACTION {
        return normalize_schedule(&args).map(DecodedAction::Schedule);
    }

    if selector == MULTISEND_SELECTOR {
        let packed = match args.first() {
            Some(DynSolValue::Bytes(packed)) => packed,
            _ => return Err(DecodeError::MultiSend("missing packed transactions".to_owned())),
        };
        return Ok(DecodedAction::MultiSend {
            action_type: entry.action_type.clone(),
            calls: multisend::unpack(packed)?,
        });
    }

    let params = entry
        .function
        .inputs
        .iter()
        .zip(&args)
        .map(|(param, value)| DecodedParam {
            name: param.name.clone(),
            ty: param.selector_type().into_owned(),
            value: to_json(value),
        })
        .collect();

    Ok(DecodedAction::Local {
        action_type: entry.action_type.clone(),
        params,
    })
}

/// Decodes timelock `schedule` calldata into a normalized action.
pub fn decode_schedule(calldata: &str) -> Result<ScheduleAction, DecodeError> {
    let selector = get_selector(calldata);
    if selector != SCHEDULE_SELECTOR {
        return Err(DecodeError::NotSchedule(selector));
    }
    match decode_local(SelectorRegistry::builtin(), calldata)? {
        DecodedAction::Schedule(action) => Ok(action),
        _ => Err(DecodeError::NotSchedule(selector)),
    }
}

fn parse_calldata(calldata: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = calldata.trim();
    let raw = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(raw).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    if bytes.len() < 4 {
        return Err(DecodeError::TooShort(bytes.len()));
    }
    Ok(bytes)
}

/// Lower-cased `0x`-prefixed selector of hex calldata, empty when too short.
pub fn get_selector(data: &str) -> String {
    let data = data.trim();
    let data = data.strip_prefix("0x").unwrap_or(data);
    match data.get(..8) {
        Some(head) => format!("0x{}", head.to_ascii_lowercase()),
        None => String::new(),
    }
}

/// JSON rendering of a decoded ABI value: integers as decimal strings, bytes as hex.
pub fn to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        // bytesN is right-padded in its word
        DynSolValue::FixedBytes(word, size) => {
            Value::String(hex::encode_prefixed(&word.as_slice()[..*size]))
        }
        DynSolValue::Address(a) => Value::String(a.to_checksum(None)),
        DynSolValue::Function(f) => Value::String(hex::encode_prefixed(f)),
        DynSolValue::Bytes(b) => Value::String(hex::encode_prefixed(b)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(to_json).collect())
        }
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{other:?}")),
    }
}
