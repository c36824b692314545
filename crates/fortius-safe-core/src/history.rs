use alloy::primitives::Address;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::decoder::CalldataDecoder;
use crate::domain::{
    ActionOutcome, AnnotatedRecord, DecodedAction, RecordInfo, TransactionRecord, TransferLeg,
    TxStatus,
};
use crate::ports::{PortError, TxHistoryPort};

/// Queue view of `account`: pending service records, each annotated with a
/// status and a decoded action.
///
/// Best effort: a failed listing is logged and yields an empty list.
pub async fn assemble_history<H: TxHistoryPort>(
    service: &H,
    decoder: &CalldataDecoder,
    account: Address,
) -> Vec<AnnotatedRecord> {
    match try_assemble_history(service, decoder, account).await {
        Ok(records) => records,
        Err(e) => {
            warn!(%account, error = %e, "failed to fetch safe transaction history");
            Vec::new()
        }
    }
}

pub async fn try_assemble_history<H: TxHistoryPort>(
    service: &H,
    decoder: &CalldataDecoder,
    account: Address,
) -> Result<Vec<AnnotatedRecord>, PortError> {
    let config = decoder.config();
    let results = service
        .all_transactions(account, &config.history_filter)
        .await?;

    let keep = results.len().saturating_sub(config.trailing_records_to_drop);
    let mut annotated = Vec::with_capacity(keep);
    for (index, raw) in results.into_iter().take(keep).enumerate() {
        if !truthy(raw.get("safe")) {
            debug!(index, "skipping history record without safe");
            continue;
        }
        match TransactionRecord::deserialize(&raw) {
            Ok(record) => {
                let info = annotate(service, decoder, account, &record).await;
                annotated.push(AnnotatedRecord { record, info });
            }
            Err(e) => {
                warn!(index, error = %e, "history record kept without decoding");
                annotated.push(unreadable(raw, e.to_string()));
            }
        }
    }

    debug!(%account, records = annotated.len(), "assembled safe history");
    Ok(annotated)
}

/// JSON truthiness as the service's consumers apply it to `safe` and `transactionHash`.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

fn unreadable(raw: Value, reason: String) -> AnnotatedRecord {
    let status = if truthy(raw.get("transactionHash")) {
        TxStatus::Complete
    } else {
        TxStatus::Pending
    };
    let extra = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    AnnotatedRecord {
        record: TransactionRecord {
            extra,
            ..TransactionRecord::default()
        },
        info: RecordInfo {
            status,
            action: ActionOutcome::unavailable(reason),
        },
    }
}

pub async fn annotate<H: TxHistoryPort>(
    service: &H,
    decoder: &CalldataDecoder,
    account: Address,
    record: &TransactionRecord,
) -> RecordInfo {
    let action = match (record.calldata(), record.to) {
        (None, to) => ActionOutcome::Decoded(DecodedAction::Transfer(vec![TransferLeg {
            to,
            value: record.value.clone().unwrap_or_else(|| "0".to_owned()),
        }])),
        (Some(calldata), Some(to)) => decoder.decode(service, account, to, calldata).await,
        (Some(calldata), None) => {
            warn!(calldata, "history record has calldata but no destination");
            ActionOutcome::unavailable("calldata without destination")
        }
    };

    RecordInfo {
        status: record.status(),
        action,
    }
}
