use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{HistoryFilter, ProposalRequest, SafeInfo, ServiceTransaction};
use crate::remote::DataDecoded;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service responded with status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
}

/// Read side of the Safe Transaction Service used to build the queue view.
#[allow(async_fn_in_trait)]
pub trait TxHistoryPort {
    /// Raw `results` of the all-transactions listing, in service order.
    async fn all_transactions(
        &self,
        safe: Address,
        filter: &HistoryFilter,
    ) -> Result<Vec<Value>, PortError>;

    async fn decode_data(&self, to: Address, data: &str) -> Result<DataDecoded, PortError>;
}

#[allow(async_fn_in_trait)]
pub trait SafeServicePort {
    async fn safe_info(&self, safe: Address) -> Result<SafeInfo, PortError>;
    async fn propose_tx(&self, safe: Address, proposal: &ProposalRequest) -> Result<(), PortError>;
    async fn confirm_tx(&self, safe_tx_hash: B256, signature: &Bytes) -> Result<(), PortError>;
    /// `Ok(None)` when the service does not know the hash.
    async fn fetch_tx(&self, safe_tx_hash: B256) -> Result<Option<ServiceTransaction>, PortError>;
    async fn balances(&self, safe: Address) -> Result<Vec<Value>, PortError>;
}

#[allow(async_fn_in_trait)]
pub trait ChainPort {
    async fn chain_id(&self) -> Result<u64, PortError>;
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError>;
    async fn balance(&self, account: Address) -> Result<U256, PortError>;
}

/// The wallet holding an owner key. Signing and submission never happen in this crate.
#[allow(async_fn_in_trait)]
pub trait OwnerSigner {
    fn address(&self) -> Address;
    /// Signature over a Safe transaction hash in the encoding the service accepts.
    async fn sign_hash(&self, hash: B256) -> Result<Bytes, PortError>;
    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<B256, PortError>;
}
