//! Display conversion for the Safe service's data-decoder responses.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::ports::TxHistoryPort;

/// Response of `POST /api/v1/data-decoder/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDecoded {
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<DecodedParameter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedParameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub value_decoded: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RemoteAction {
    Single {
        #[serde(rename = "type")]
        method: String,
        data: Map<String, Value>,
    },
    Batch(Vec<Map<String, Value>>),
}

/// Asks the service to decode `calldata` sent to `to`.
///
/// Any failure is logged with the calldata and reported as `None`.
pub async fn decode_via_service<H: TxHistoryPort>(
    service: &H,
    to: Address,
    calldata: &str,
) -> Option<RemoteAction> {
    match service.decode_data(to, calldata).await {
        Ok(decoded) => Some(convert_for_display(&decoded)),
        Err(e) => {
            warn!(%to, calldata, error = %e, "remote calldata decode failed");
            None
        }
    }
}

/// Flattens a decoder response into `{name: value}` maps.
///
/// When the first parameter carries nested decoded calls, the result is the
/// list of sub-calls that share the method of the first decoded sub-call.
pub fn convert_for_display(decoded: &DataDecoded) -> RemoteAction {
    let nested = decoded
        .parameters
        .first()
        .is_some_and(|p| p.value_decoded.as_ref().is_some_and(|v| !v.is_null()));

    if !nested {
        let data = decoded
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        return RemoteAction::Single {
            method: decoded.method.clone(),
            data,
        };
    }

    let Some(sub_calls) = decoded
        .parameters
        .iter()
        .find(|p| p.name == "transactions")
        .and_then(|p| p.value_decoded.as_ref())
        .and_then(Value::as_array)
    else {
        return RemoteAction::Batch(Vec::new());
    };

    let Some(method) = sub_calls.iter().find_map(sub_call_method) else {
        return RemoteAction::Batch(Vec::new());
    };

    let calls = sub_calls
        .iter()
        .filter(|tx| sub_call_method(tx) == Some(method))
        .map(flatten_sub_call)
        .collect();
    RemoteAction::Batch(calls)
}

fn sub_call_method(tx: &Value) -> Option<&str> {
    tx.get("dataDecoded")?
        .get("method")?
        .as_str()
        .filter(|m| !m.is_empty())
}

fn flatten_sub_call(tx: &Value) -> Map<String, Value> {
    tx.get("dataDecoded")
        .and_then(|d| d.get("parameters"))
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter_map(|p| {
                    let name = p.get("name")?.as_str()?;
                    Some((name.to_owned(), p.get("value").cloned().unwrap_or(Value::Null)))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoded(raw: Value) -> DataDecoded {
        serde_json::from_value(raw).expect("data decoded")
    }

    #[test]
    fn plain_call_becomes_single_map() {
        let action = convert_for_display(&decoded(json!({
            "method": "addOwnerWithThreshold",
            "parameters": [
                {"name": "owner", "type": "address", "value": "0x000000000000000000000000000000000000CAFE"},
                {"name": "_threshold", "type": "uint256", "value": "2"}
            ]
        })));

        let RemoteAction::Single { method, data } = action else {
            panic!("expected single action");
        };
        assert_eq!(method, "addOwnerWithThreshold");
        assert_eq!(data.get("_threshold"), Some(&json!("2")));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn empty_parameter_list_gives_empty_data() {
        let action = convert_for_display(&decoded(json!({"method": "foo", "parameters": []})));
        assert_eq!(
            serde_json::to_value(action).expect("serialize"),
            json!({"type": "foo", "data": {}})
        );
    }

    #[test]
    fn batch_keeps_only_sub_calls_of_the_first_method() {
        let action = convert_for_display(&decoded(json!({
            "method": "multiSend",
            "parameters": [{
                "name": "transactions",
                "type": "bytes",
                "value": "0x00",
                "valueDecoded": [
                    {"operation": 0, "to": "0x1", "value": "0", "dataDecoded": {
                        "method": "transfer",
                        "parameters": [
                            {"name": "to", "type": "address", "value": "0xA"},
                            {"name": "value", "type": "uint256", "value": "10"}
                        ]
                    }},
                    {"operation": 0, "to": "0x2", "value": "0", "dataDecoded": {
                        "method": "approve",
                        "parameters": [{"name": "spender", "type": "address", "value": "0xB"}]
                    }},
                    {"operation": 0, "to": "0x3", "value": "5", "dataDecoded": null},
                    {"operation": 0, "to": "0x1", "value": "0", "dataDecoded": {
                        "method": "transfer",
                        "parameters": [
                            {"name": "to", "type": "address", "value": "0xC"},
                            {"name": "value", "type": "uint256", "value": "20"}
                        ]
                    }}
                ]
            }]
        })));

        assert_eq!(
            serde_json::to_value(action).expect("serialize"),
            json!([
                {"to": "0xA", "value": "10"},
                {"to": "0xC", "value": "20"}
            ])
        );
    }

    #[test]
    fn nested_response_without_transactions_is_empty_batch() {
        let action = convert_for_display(&decoded(json!({
            "method": "execute",
            "parameters": [{"name": "payload", "type": "bytes", "value": "0x", "valueDecoded": []}]
        })));
        assert_eq!(action, RemoteAction::Batch(Vec::new()));
    }
}
