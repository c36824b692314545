pub mod config;
pub mod handler;
pub mod hashing;
pub mod rpc;
pub mod safe_service;

use alloy::primitives::Address;
use tracing::warn;

use fortius_safe_core::{assemble_history, AnnotatedRecord, CalldataDecoder};

pub use config::{AdapterConfig, ConfigError};
pub use fortius_safe_core::decode_schedule;
pub use handler::SafeHandler;
pub use rpc::JsonRpcAdapter;
pub use safe_service::SafeServiceAdapter;

/// Decoded queue of `safe` from the service at `chain_url`, with default decoder settings.
pub async fn get_safe_history(chain_url: &str, safe: Address) -> Vec<AnnotatedRecord> {
    let cfg = AdapterConfig {
        safe_service_base_url: chain_url.to_owned(),
        ..AdapterConfig::default()
    };
    let service = match SafeServiceAdapter::with_config(&cfg) {
        Ok(service) => service,
        Err(e) => {
            warn!(chain_url, error = %e, "cannot build safe service client");
            return Vec::new();
        }
    };
    assemble_history(&service, &CalldataDecoder::default(), safe).await
}
