#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::{Address, Bytes, B256};
use serde_json::{json, Value};
use tiny_http::{Method, Response, Server, StatusCode};

use fortius_safe_adapters::{AdapterConfig, JsonRpcAdapter, SafeHandler, SafeServiceAdapter};
use fortius_safe_core::{OwnerSigner, PortError};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

pub type Calls = Arc<Mutex<Vec<RecordedCall>>>;

/// Serves `route` on an ephemeral port until the test process exits.
pub fn spawn_mock_server<F>(route: F) -> (String, Calls)
where
    F: Fn(&Method, &str, &Value) -> (u16, Value) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    thread::spawn(move || {
        for mut req in server.incoming_requests() {
            let method = req.method().clone();
            let path = req.url().to_ascii_lowercase();
            let mut raw = String::new();
            let _ = req.as_reader().read_to_string(&mut raw);
            let body = serde_json::from_str(&raw).unwrap_or(Value::Null);

            let (code, payload) = route(&method, &path, &body);
            if let Ok(mut g) = recorded.lock() {
                g.push(RecordedCall { method, path, body });
            }

            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    (addr, calls)
}

pub fn rpc_result(body: &Value, result: Value) -> (u16, Value) {
    (
        200,
        json!({"jsonrpc": "2.0", "id": body.get("id").cloned().unwrap_or(json!(1)), "result": result}),
    )
}

#[derive(Debug, Clone, Default)]
pub struct StubSigner {
    pub signed: Arc<Mutex<Vec<B256>>>,
    pub sent: Arc<Mutex<Vec<(Address, Bytes)>>>,
}

impl OwnerSigner for StubSigner {
    fn address(&self) -> Address {
        owner_a()
    }

    async fn sign_hash(&self, hash: B256) -> Result<Bytes, PortError> {
        self.signed.lock().expect("signed lock").push(hash);
        Ok(Bytes::from(vec![0x11; 65]))
    }

    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<B256, PortError> {
        self.sent.lock().expect("sent lock").push((to, data));
        Ok(B256::repeat_byte(0xaa))
    }
}

pub type TestHandler = SafeHandler<SafeServiceAdapter, JsonRpcAdapter, StubSigner>;

pub fn test_config(base_url: &str) -> AdapterConfig {
    AdapterConfig {
        safe_service_base_url: base_url.to_owned(),
        safe_service_timeout_ms: 5_000,
        rpc_url: Some(format!("{base_url}/rpc")),
        timelock_module_address: Some(timelock_address()),
        ..AdapterConfig::default()
    }
}

pub fn new_handler(cfg: &AdapterConfig, signer: StubSigner) -> TestHandler {
    let service = SafeServiceAdapter::with_config(cfg).expect("safe service");
    let rpc_url = cfg.rpc_url.clone().expect("rpc url");
    let chain = JsonRpcAdapter::new(rpc_url, cfg.safe_service_timeout_ms).expect("rpc");
    SafeHandler::new(cfg, safe_address(), service, chain, signer)
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

pub fn owner_a() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("owner a")
}

pub fn owner_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("owner b")
}

pub fn safe_info_json(nonce: u64, threshold: u64) -> Value {
    json!({
        "address": safe_address(),
        "nonce": nonce,
        "threshold": threshold,
        "owners": [owner_a(), owner_b()],
        "masterCopy": "0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552",
        "version": "1.3.0"
    })
}

pub fn service_tx_json(confirmations: &[Address], required: u64) -> Value {
    let confirmations: Vec<Value> = confirmations
        .iter()
        .enumerate()
        .map(|(i, owner)| {
            json!({
                "owner": owner,
                "signature": format!("0x{}", format!("{:02x}", i + 1).repeat(65)),
            })
        })
        .collect();
    json!({
        "safe": safe_address(),
        "to": "0x000000000000000000000000000000000000CAFE",
        "value": "1000",
        "data": null,
        "operation": 0,
        "safeTxGas": "0",
        "baseGas": "0",
        "gasPrice": "0",
        "gasToken": "0x0000000000000000000000000000000000000000",
        "refundReceiver": "0x0000000000000000000000000000000000000000",
        "nonce": 5,
        "safeTxHash": format!("0x{}", "33".repeat(32)),
        "confirmationsRequired": required,
        "confirmations": confirmations,
        "isExecuted": false,
        "transactionHash": null
    })
}
