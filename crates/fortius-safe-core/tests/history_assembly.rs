mod common;

use alloy::primitives::{Address, U256};
use serde_json::json;

use common::{filler, record, safe_address, schedule_calldata, timelock_address, StubService};
use fortius_safe_core::{
    assemble_history, try_assemble_history, ActionOutcome, CalldataDecoder, DecodedAction,
    DecoderConfig, RemoteAction, SelectorRegistry, TxStatus, DEFAULT_DELEGATION_TARGET,
};

fn with_fillers(mut records: Vec<serde_json::Value>) -> Vec<serde_json::Value> {
    records.extend([filler(), filler(), filler()]);
    records
}

#[tokio::test]
async fn trailing_records_and_records_without_safe_are_dropped() {
    let recipient = Address::repeat_byte(0x11);
    let mut no_safe = record(recipient, None, None);
    no_safe.as_object_mut().expect("object").remove("safe");

    let service = StubService::with_results(with_fillers(vec![
        record(recipient, None, None),
        no_safe,
        record(recipient, None, Some("0xabc")),
    ]));

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].info.status, TxStatus::Pending);
    assert_eq!(history[1].info.status, TxStatus::Complete);
}

#[tokio::test]
async fn records_with_safe_survive_odd_field_types() {
    let recipient = Address::repeat_byte(0x11);
    let mut numeric_value = record(recipient, None, None);
    numeric_value["value"] = json!(5);
    let mut bad_to = record(recipient, Some("0xa9059cbb00"), None);
    bad_to["to"] = json!("not an address");
    let mut empty_safe = record(recipient, None, None);
    empty_safe["safe"] = json!("");

    let service = StubService::with_results(with_fillers(vec![numeric_value, bad_to, empty_safe]));
    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;

    assert_eq!(history.len(), 2);
    let value = serde_json::to_value(&history[0]).expect("serialize");
    assert_eq!(
        value["info"]["action"]["data"],
        json!([{"to": recipient, "value": "5"}])
    );
    assert!(matches!(
        history[1].info.action,
        ActionOutcome::Unavailable { .. }
    ));
    assert!(service.decode_calls().is_empty());
}

#[tokio::test]
async fn unavailable_action_serializes_with_reason() {
    let service = StubService::with_results(with_fillers(vec![record(
        Address::repeat_byte(0x22),
        Some("0xa9059cbb00"),
        None,
    )]));

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    let value = serde_json::to_value(&history[0]).expect("serialize");
    assert_eq!(value["info"]["action"]["outcome"], json!("unavailable"));
    assert!(value["info"]["action"]["reason"]
        .as_str()
        .expect("reason")
        .contains("0xa9059cbb"));
}

#[tokio::test]
async fn short_listing_yields_nothing() {
    let service = StubService::with_results(vec![filler(), filler()]);
    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    assert!(history.is_empty());
}

#[tokio::test]
async fn empty_calldata_becomes_transfer_descriptor() {
    let recipient = Address::repeat_byte(0x11);
    let mut native = record(recipient, Some("0x"), None);
    native["value"] = json!("1000");

    let service = StubService::with_results(with_fillers(vec![native]));
    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;

    let value = serde_json::to_value(&history[0]).expect("serialize");
    assert_eq!(value["info"]["action"]["type"], json!("Transfer"));
    assert_eq!(
        value["info"]["action"]["data"],
        json!([{"to": recipient, "value": "1000"}])
    );
    assert_eq!(value["txType"], json!("MULTISIG_TRANSACTION"));
    assert!(service.decode_calls().is_empty());
}

#[tokio::test]
async fn schedule_calldata_is_decoded_locally() {
    let recipient = Address::repeat_byte(0x11);
    let calldata = schedule_calldata(recipient, 100);
    let service = StubService::with_results(with_fillers(vec![record(
        timelock_address(),
        Some(calldata.as_str()),
        None,
    )]));

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    let Some(DecodedAction::Schedule(action)) = history[0].info.action.decoded() else {
        panic!("expected schedule action, got {:?}", history[0].info.action);
    };
    assert_eq!(action.recipients, vec![recipient]);
    assert_eq!(action.values, vec![U256::from(100u64)]);
    assert!(service.decode_calls().is_empty());
}

#[tokio::test]
async fn calls_to_the_safe_itself_are_delegated_even_for_known_selectors() {
    let calldata = schedule_calldata(Address::repeat_byte(0x11), 100);
    let service = StubService::with_results(with_fillers(vec![record(
        safe_address(),
        Some(calldata.as_str()),
        None,
    )]));

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    assert!(matches!(
        history[0].info.action.decoded(),
        Some(DecodedAction::Remote(RemoteAction::Single { .. }))
    ));
    assert_eq!(service.decode_calls(), vec![(safe_address(), calldata)]);
}

#[tokio::test]
async fn delegation_target_goes_to_the_remote_decoder() {
    let service = StubService::with_results(with_fillers(vec![record(
        DEFAULT_DELEGATION_TARGET,
        Some("0x8d80ff0a00"),
        None,
    )]));

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    let value = serde_json::to_value(&history[0].info.action).expect("serialize");
    assert_eq!(value["type"], json!("multiSend"));
    assert_eq!(service.decode_calls().len(), 1);
}

#[tokio::test]
async fn failed_remote_decode_marks_action_unavailable() {
    let service = StubService {
        fail_decode: true,
        ..StubService::with_results(with_fillers(vec![record(
            DEFAULT_DELEGATION_TARGET,
            Some("0x8d80ff0a00"),
            None,
        )]))
    };

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    assert_eq!(history.len(), 1);
    assert!(matches!(
        history[0].info.action,
        ActionOutcome::Unavailable { .. }
    ));
}

#[tokio::test]
async fn unknown_selector_keeps_the_record() {
    let service = StubService::with_results(with_fillers(vec![
        record(Address::repeat_byte(0x22), Some("0xa9059cbb00"), None),
        record(Address::repeat_byte(0x33), None, None),
    ]));

    let history = assemble_history(&service, &CalldataDecoder::default(), safe_address()).await;
    assert_eq!(history.len(), 2);
    assert!(matches!(
        history[0].info.action,
        ActionOutcome::Unavailable { ref reason } if reason.contains("0xa9059cbb")
    ));
    assert_eq!(history[1].record.to, Some(Address::repeat_byte(0x33)));
}

#[tokio::test]
async fn listing_failure_is_empty_but_visible_through_try() {
    let service = StubService {
        fail_listing: true,
        ..StubService::default()
    };
    let decoder = CalldataDecoder::default();

    assert!(assemble_history(&service, &decoder, safe_address())
        .await
        .is_empty());
    assert!(try_assemble_history(&service, &decoder, safe_address())
        .await
        .is_err());
}

#[tokio::test]
async fn trailing_drop_is_configurable() {
    let decoder = CalldataDecoder::new(
        SelectorRegistry::builtin().clone(),
        DecoderConfig {
            trailing_records_to_drop: 0,
            ..DecoderConfig::default()
        },
    );
    let service = StubService::with_results(vec![
        record(Address::repeat_byte(0x01), None, None),
        record(Address::repeat_byte(0x02), None, None),
    ]);

    let history = assemble_history(&service, &decoder, safe_address()).await;
    let targets: Vec<_> = history.iter().map(|r| r.record.to).collect();
    assert_eq!(
        targets,
        vec![Some(Address::repeat_byte(0x01)), Some(Address::repeat_byte(0x02))]
    );
}
