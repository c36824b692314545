mod common;

use alloy::primitives::{Address, B256};
use serde_json::json;
use tiny_http::Method;

use common::{safe_address, service_tx_json, spawn_mock_server};
use fortius_safe_adapters::{get_safe_history, AdapterConfig, SafeServiceAdapter};
use fortius_safe_core::{
    ActionOutcome, DecodedAction, HistoryFilter, PortError, RemoteAction, SafeServicePort,
    TxHistoryPort, TxStatus, DEFAULT_DELEGATION_TARGET,
};

const LISTING_PATH: &str = "/api/v1/safes/0x000000000000000000000000000000000000beef/all-transactions/?executed=false&queued=true&trusted=true";

fn adapter(base_url: String) -> SafeServiceAdapter {
    SafeServiceAdapter::with_config(&AdapterConfig {
        safe_service_base_url: base_url,
        safe_service_timeout_ms: 5_000,
        ..AdapterConfig::default()
    })
    .expect("adapter")
}

#[tokio::test]
async fn listing_uses_queue_filter_query() {
    let (base_url, calls) = spawn_mock_server(|method, path, _| match (method, path) {
        (Method::Get, LISTING_PATH) => (
            200,
            json!({"count": 1, "next": null, "previous": null, "results": [{"safe": safe_address()}]}),
        ),
        _ => (404, json!({"detail": "not found"})),
    });

    let results = adapter(base_url)
        .all_transactions(safe_address(), &HistoryFilter::default())
        .await
        .expect("listing");
    assert_eq!(results.len(), 1);

    let calls = calls.lock().expect("calls lock");
    assert_eq!(calls[0].path, LISTING_PATH);
}

#[tokio::test]
async fn listing_failure_surfaces_status() {
    let (base_url, _calls) = spawn_mock_server(|_, _, _| (500, json!({"detail": "boom"})));

    let err = adapter(base_url)
        .all_transactions(safe_address(), &HistoryFilter::default())
        .await
        .expect_err("server error");
    assert!(matches!(err, PortError::Http { status: 500, .. }));
}

#[tokio::test]
async fn data_decoder_posts_data_and_destination() {
    let (base_url, calls) = spawn_mock_server(|method, path, _| match (method, path) {
        (Method::Post, "/api/v1/data-decoder/") => (
            200,
            json!({"method": "multiSend", "parameters": [{"name": "transactions", "type": "bytes", "value": "0x"}]}),
        ),
        _ => (404, json!({})),
    });

    let decoded = adapter(base_url)
        .decode_data(DEFAULT_DELEGATION_TARGET, "0x8d80ff0a")
        .await
        .expect("decode");
    assert_eq!(decoded.method, "multiSend");

    let calls = calls.lock().expect("calls lock");
    assert_eq!(calls[0].body["data"], json!("0x8d80ff0a"));
    assert_eq!(
        calls[0].body["to"]
            .as_str()
            .expect("to")
            .parse::<Address>()
            .expect("address"),
        DEFAULT_DELEGATION_TARGET
    );
}

#[tokio::test]
async fn unknown_transaction_is_none() {
    let (base_url, _calls) = spawn_mock_server(|method, path, _| match method {
        Method::Get if path.ends_with(&format!("{}/", "11".repeat(32))) => {
            (200, service_tx_json(&[], 1))
        }
        _ => (404, json!({"detail": "No MultisigTransaction matches the given query."})),
    });
    let service = adapter(base_url);

    assert!(service
        .fetch_tx(B256::repeat_byte(0x22))
        .await
        .expect("fetch")
        .is_none());
    let known = service
        .fetch_tx(B256::repeat_byte(0x11))
        .await
        .expect("fetch")
        .expect("known tx");
    assert_eq!(known.confirmations_required, 1);
}

#[tokio::test]
async fn safe_history_end_to_end() {
    let (base_url, calls) = spawn_mock_server(|method, path, _| match (method, path) {
        (Method::Get, LISTING_PATH) => (
            200,
            json!({"results": [
                {"safe": safe_address(), "to": DEFAULT_DELEGATION_TARGET, "value": "0", "data": "0x8d80ff0a00", "transactionHash": null},
                {"safe": safe_address(), "to": "0x000000000000000000000000000000000000CAFE", "value": "7", "data": null, "transactionHash": "0xfeed"},
                {"txType": "ETHEREUM_TRANSACTION"},
                {"txType": "ETHEREUM_TRANSACTION"},
                {"txType": "ETHEREUM_TRANSACTION"}
            ]}),
        ),
        (Method::Post, "/api/v1/data-decoder/") => (
            200,
            json!({"method": "addOwnerWithThreshold", "parameters": [
                {"name": "owner", "type": "address", "value": "0x000000000000000000000000000000000000CAFE"},
                {"name": "_threshold", "type": "uint256", "value": "2"}
            ]}),
        ),
        _ => (404, json!({})),
    });

    let history = get_safe_history(&base_url, safe_address()).await;
    assert_eq!(history.len(), 2);

    match history[0].info.action.decoded() {
        Some(DecodedAction::Remote(RemoteAction::Single { method, data })) => {
            assert_eq!(method, "addOwnerWithThreshold");
            assert_eq!(data["_threshold"], json!("2"));
        }
        other => panic!("unexpected action {other:?}"),
    }
    assert_eq!(history[1].info.status, TxStatus::Complete);
    assert!(matches!(
        history[1].info.action,
        ActionOutcome::Decoded(DecodedAction::Transfer(_))
    ));

    let calls = calls.lock().expect("calls lock");
    assert_eq!(calls.len(), 2);
}

#[tokio::test]
async fn unreachable_service_gives_empty_history() {
    let history = get_safe_history("http://127.0.0.1:9", safe_address()).await;
    assert!(history.is_empty());
}
