//! Minimal JSON-RPC client for the read calls the handler needs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256, U64};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use fortius_safe_core::{ChainPort, PortError};

use crate::safe_service::{read_json, transport};

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Clone)]
pub struct JsonRpcAdapter {
    url: String,
    client: Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcAdapter {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, PortError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let envelope: RpcResponse<T> = read_json(response).await?;
        if let Some(err) = envelope.error {
            return Err(PortError::Transport(format!(
                "{method} failed ({}): {}",
                err.code, err.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| PortError::Validation(format!("{method} returned no result")))
    }
}

impl ChainPort for JsonRpcAdapter {
    async fn chain_id(&self) -> Result<u64, PortError> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError> {
        self.request("eth_call", json!([{"to": to, "data": data}, "latest"]))
            .await
    }

    async fn balance(&self, account: Address) -> Result<U256, PortError> {
        self.request("eth_getBalance", json!([account, "latest"]))
            .await
    }
}
