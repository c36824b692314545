#![allow(dead_code)]

use std::sync::Mutex;

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::{hex, Address, B256, U256};
use serde_json::{json, Value};

use fortius_safe_core::{DataDecoded, HistoryFilter, PortError, SelectorRegistry, TxHistoryPort};

/// In-memory data decoder and history listing.
#[derive(Debug, Default)]
pub struct StubService {
    pub results: Vec<Value>,
    pub fail_listing: bool,
    pub fail_decode: bool,
    pub decode_calls: Mutex<Vec<(Address, String)>>,
}

impl StubService {
    pub fn with_results(results: Vec<Value>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn decode_calls(&self) -> Vec<(Address, String)> {
        self.decode_calls.lock().expect("decode calls lock").clone()
    }
}

impl TxHistoryPort for StubService {
    async fn all_transactions(
        &self,
        _safe: Address,
        _filter: &HistoryFilter,
    ) -> Result<Vec<Value>, PortError> {
        if self.fail_listing {
            return Err(PortError::Transport("connection refused".to_owned()));
        }
        Ok(self.results.clone())
    }

    async fn decode_data(&self, to: Address, data: &str) -> Result<DataDecoded, PortError> {
        self.decode_calls
            .lock()
            .expect("decode calls lock")
            .push((to, data.to_owned()));
        if self.fail_decode {
            return Err(PortError::Http {
                status: 503,
                body: "unavailable".to_owned(),
            });
        }
        Ok(serde_json::from_value(json!({
            "method": "multiSend",
            "parameters": [{"name": "transactions", "type": "bytes", "value": data}]
        }))
        .expect("decoded fixture"))
    }
}

pub fn safe_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid safe address")
}

pub fn timelock_address() -> Address {
    "0x0000000000000000000000000000000000007143"
        .parse()
        .expect("valid timelock address")
}

pub fn record(to: Address, data: Option<&str>, tx_hash: Option<&str>) -> Value {
    json!({
        "safe": safe_address(),
        "to": to,
        "value": "0",
        "data": data,
        "transactionHash": tx_hash,
        "txType": "MULTISIG_TRANSACTION"
    })
}

/// A record the listing appends after the real queue.
pub fn filler() -> Value {
    json!({"txType": "ETHEREUM_TRANSACTION", "to": safe_address(), "data": null})
}

pub fn schedule_calldata(recipient: Address, amount: u64) -> String {
    let function = &SelectorRegistry::builtin()
        .lookup("0x6673bff6")
        .expect("schedule entry")
        .function;
    let encoded = function
        .abi_encode_input(&[
            DynSolValue::Address(Address::repeat_byte(0xaa)),
            DynSolValue::Array(vec![DynSolValue::Address(recipient)]),
            DynSolValue::Array(vec![DynSolValue::Uint(U256::from(amount), 256)]),
            DynSolValue::Uint(U256::from(1_700_000_000u64), 256),
            DynSolValue::Bool(true),
            DynSolValue::Bool(false),
            DynSolValue::FixedBytes(B256::ZERO, 32),
        ])
        .expect("encode schedule");
    hex::encode_prefixed(encoded)
}
