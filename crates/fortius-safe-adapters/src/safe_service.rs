//! Safe Transaction Service client over HTTP.

use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use fortius_safe_core::{
    DataDecoded, HistoryFilter, PortError, ProposalRequest, SafeInfo, SafeServicePort,
    ServiceTransaction, TxHistoryPort,
};

use crate::config::AdapterConfig;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct DecodeRequest<'a> {
    data: &'a str,
    to: Address,
}

#[derive(Debug, Serialize)]
struct ConfirmationRequest<'a> {
    signature: &'a Bytes,
}

#[derive(Debug, Clone)]
pub struct SafeServiceAdapter {
    base_url: String,
    client: Client,
}

impl Default for SafeServiceAdapter {
    fn default() -> Self {
        Self::new("https://safe-transaction-mainnet.safe.global")
    }
}

impl SafeServiceAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    pub fn with_config(cfg: &AdapterConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.safe_service_timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("http client: {e}")))?;
        Ok(Self {
            base_url: cfg.safe_service_base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PortError> {
        debug!(url, "safe service GET");
        let response = self.client.get(url).send().await.map_err(transport)?;
        read_json(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, PortError> {
        debug!(url, "safe service POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn post_accepted<B: Serialize>(&self, url: &str, body: &B) -> Result<(), PortError> {
        debug!(url, "safe service POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await.map(|_| ())
    }
}

impl TxHistoryPort for SafeServiceAdapter {
    async fn all_transactions(
        &self,
        safe: Address,
        filter: &HistoryFilter,
    ) -> Result<Vec<Value>, PortError> {
        let url = self.url(&format!(
            "safes/{}/all-transactions/?{}",
            safe.to_checksum(None),
            filter.query_string()
        ));
        let page: Page = self.get_json(&url).await?;
        Ok(page.results)
    }

    async fn decode_data(&self, to: Address, data: &str) -> Result<DataDecoded, PortError> {
        self.post_json(&self.url("data-decoder/"), &DecodeRequest { data, to })
            .await
    }
}

impl SafeServicePort for SafeServiceAdapter {
    async fn safe_info(&self, safe: Address) -> Result<SafeInfo, PortError> {
        self.get_json(&self.url(&format!("safes/{}/", safe.to_checksum(None))))
            .await
    }

    async fn propose_tx(&self, safe: Address, proposal: &ProposalRequest) -> Result<(), PortError> {
        let url = self.url(&format!(
            "safes/{}/multisig-transactions/",
            safe.to_checksum(None)
        ));
        self.post_accepted(&url, proposal).await
    }

    async fn confirm_tx(&self, safe_tx_hash: B256, signature: &Bytes) -> Result<(), PortError> {
        let url = self.url(&format!("multisig-transactions/{safe_tx_hash}/confirmations/"));
        self.post_accepted(&url, &ConfirmationRequest { signature })
            .await
    }

    async fn fetch_tx(&self, safe_tx_hash: B256) -> Result<Option<ServiceTransaction>, PortError> {
        let url = self.url(&format!("multisig-transactions/{safe_tx_hash}/"));
        match self.get_json(&url).await {
            Ok(tx) => Ok(Some(tx)),
            Err(PortError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn balances(&self, safe: Address) -> Result<Vec<Value>, PortError> {
        let url = self.url(&format!(
            "safes/{}/balances/?exclude_spam=true",
            safe.to_checksum(None)
        ));
        self.get_json(&url).await
    }
}

pub(crate) fn transport(e: reqwest::Error) -> PortError {
    PortError::Transport(e.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, PortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PortError::Http {
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PortError> {
    let response = ensure_success(response).await?;
    if response.status() == StatusCode::NO_CONTENT {
        return Err(PortError::Validation("empty response body".to_owned()));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| PortError::Validation(format!("unexpected response body: {e}")))
}
