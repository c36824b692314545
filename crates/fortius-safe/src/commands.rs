use alloy::primitives::Address;
use eyre::{Result, WrapErr};
use serde::Serialize;
use tracing::info;

use fortius_safe_adapters::{decode_schedule, AdapterConfig, SafeServiceAdapter};
use fortius_safe_core::{
    annotate, try_assemble_history, ActionOutcome, CalldataDecoder, SafeServicePort,
    SelectorRegistry, TransactionRecord, TxHistoryPort,
};

use crate::cli::ServiceArgs;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Environment configuration with command-line flags layered on top.
pub fn load_config(service: &ServiceArgs) -> Result<AdapterConfig> {
    let mut cfg = AdapterConfig::from_env().wrap_err("reading FORTIUS_* environment")?;
    if let Some(url) = &service.service_url {
        cfg.safe_service_base_url = url.clone();
    }
    if let Some(timeout_ms) = service.timeout_ms {
        cfg.safe_service_timeout_ms = timeout_ms;
    }
    Ok(cfg)
}

fn decoder_for(cfg: &AdapterConfig) -> CalldataDecoder {
    CalldataDecoder::new(SelectorRegistry::builtin().clone(), cfg.decoder_config())
}

pub async fn history(
    safe: Address,
    service: &ServiceArgs,
    trailing_drop: Option<usize>,
    delegates: Vec<Address>,
) -> Result<()> {
    let mut cfg = load_config(service)?;
    if let Some(drop) = trailing_drop {
        cfg.trailing_records_to_drop = drop;
    }
    if !delegates.is_empty() {
        cfg.delegation_targets = delegates.into_iter().collect();
    }

    let client = SafeServiceAdapter::with_config(&cfg)?;
    info!(%safe, service = client.base_url(), "fetching pending queue");
    let records = try_assemble_history(&client, &decoder_for(&cfg), safe)
        .await
        .wrap_err_with(|| format!("listing transactions of {safe}"))?;
    print_json(&records)
}

pub fn decode_schedule_calldata(calldata: &str) -> Result<()> {
    let action = decode_schedule(calldata).wrap_err("not a timelock schedule call")?;
    print_json(&action)
}

/// Decodes one call the way the queue view treats a record, so empty
/// calldata is a transfer and never reaches a decoder.
pub async fn decode_call<H: TxHistoryPort>(
    service: &H,
    decoder: &CalldataDecoder,
    safe: Address,
    to: Address,
    value: &str,
    calldata: &str,
) -> ActionOutcome {
    let record = TransactionRecord {
        to: Some(to),
        value: Some(value.to_owned()),
        data: Some(calldata.to_owned()),
        safe: Some(safe),
        ..TransactionRecord::default()
    };
    annotate(service, decoder, safe, &record).await.action
}

pub async fn decode(
    safe: Address,
    to: Address,
    value: &str,
    calldata: &str,
    service: &ServiceArgs,
) -> Result<()> {
    let cfg = load_config(service)?;
    let client = SafeServiceAdapter::with_config(&cfg)?;
    let outcome = decode_call(&client, &decoder_for(&cfg), safe, to, value, calldata).await;
    print_json(&outcome)
}

pub async fn balances(safe: Address, service: &ServiceArgs) -> Result<()> {
    let cfg = load_config(service)?;
    let client = SafeServiceAdapter::with_config(&cfg)?;
    let balances = client
        .balances(safe)
        .await
        .wrap_err_with(|| format!("fetching balances of {safe}"))?;
    print_json(&balances)
}
