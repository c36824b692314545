use alloy::primitives::{Address, Bytes, B256, U256};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::remote::RemoteAction;

/// Tag carried by native/ERC-20 transfer descriptors built from records without calldata.
pub const TRANSFER_ACTION: &str = "Transfer";

/// Action type of the timelock `schedule` selector.
pub const SCHEDULE_ACTION: &str = "schedule";

/// Action type of the `multiSend` selector. The misspelling is what existing consumers match on.
pub const MULTISEND_ACTION: &str = "MutiSend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl From<Operation> for u8 {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

impl TryFrom<u8> for Operation {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::DelegateCall),
            other => Err(format!("unknown safe operation {other}")),
        }
    }
}

/// A Safe transaction before nonce and signatures are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeTxDraft {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
}

impl SafeTxDraft {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
            operation: Operation::Call,
        }
    }

    pub fn native(to: Address, value: U256) -> Self {
        Self {
            to,
            value,
            data: Bytes::new(),
            operation: Operation::Call,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Complete,
}

/// One entry of the Safe service's all-transactions listing.
///
/// Only the fields the assembler reads are typed; everything else the
/// service sends is carried through `extra` untouched. The typed fields
/// accept whatever JSON the service puts there, so an object never fails
/// to read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "lenient::maybe_address")]
    pub to: Option<Address>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub transaction_hash: Option<String>,
    #[serde(default, deserialize_with = "lenient::maybe_address")]
    pub safe: Option<Address>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionRecord {
    pub fn status(&self) -> TxStatus {
        match self.transaction_hash.as_deref() {
            Some(hash) if !hash.is_empty() => TxStatus::Complete,
            _ => TxStatus::Pending,
        }
    }

    /// Calldata of the record, `None` when absent, empty or a bare `0x`.
    pub fn calldata(&self) -> Option<&str> {
        self.data.as_deref().and_then(non_empty_calldata)
    }
}

/// `data` trimmed, or `None` when it carries no call (empty or a bare `0x`).
pub fn non_empty_calldata(data: &str) -> Option<&str> {
    let data = data.trim();
    (!data.is_empty() && data != "0x" && data != "0X").then_some(data)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferLeg {
    pub to: Option<Address>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleAction {
    pub token: Address,
    pub recipients: Vec<Address>,
    #[serde(serialize_with = "amount::serialize_all")]
    pub values: Vec<U256>,
    #[serde(serialize_with = "amount::serialize")]
    pub timestamp: U256,
    pub escrow: bool,
    pub cancellable: bool,
    pub salt: B256,
}

impl ScheduleAction {
    pub fn amount_total(&self) -> U256 {
        self.values
            .iter()
            .fold(U256::ZERO, |acc, v| acc.saturating_add(*v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiSendCall {
    pub operation: u8,
    pub to: Address,
    #[serde(serialize_with = "amount::serialize")]
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedAction {
    Transfer(Vec<TransferLeg>),
    Local {
        action_type: String,
        params: Vec<DecodedParam>,
    },
    Schedule(ScheduleAction),
    MultiSend {
        action_type: String,
        calls: Vec<MultiSendCall>,
    },
    Remote(RemoteAction),
}

impl DecodedAction {
    pub fn action_type(&self) -> Option<&str> {
        match self {
            DecodedAction::Transfer(_) => Some(TRANSFER_ACTION),
            DecodedAction::Local { action_type, .. }
            | DecodedAction::MultiSend { action_type, .. } => Some(action_type.as_str()),
            DecodedAction::Schedule(_) => Some(SCHEDULE_ACTION),
            DecodedAction::Remote(RemoteAction::Single { method, .. }) => Some(method.as_str()),
            DecodedAction::Remote(RemoteAction::Batch(_)) => None,
        }
    }
}

struct ParamValues<'a>(&'a [DecodedParam]);

impl Serialize for ParamValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| (&p.name, &p.value)))
    }
}

#[derive(Serialize)]
struct MultiSendValue<'a> {
    transactions: &'a [MultiSendCall],
}

fn action_entry<S: Serializer, T: Serialize>(
    serializer: S,
    action_type: &str,
    value: &T,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("actionType", action_type)?;
    map.serialize_entry("value", value)?;
    map.end()
}

impl Serialize for DecodedAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedAction::Transfer(legs) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", TRANSFER_ACTION)?;
                map.serialize_entry("data", legs)?;
                map.end()
            }
            DecodedAction::Local {
                action_type,
                params,
            } => action_entry(serializer, action_type, &ParamValues(params)),
            DecodedAction::Schedule(schedule) => action_entry(serializer, SCHEDULE_ACTION, schedule),
            DecodedAction::MultiSend { action_type, calls } => action_entry(
                serializer,
                action_type,
                &MultiSendValue {
                    transactions: calls,
                },
            ),
            DecodedAction::Remote(remote) => remote.serialize(serializer),
        }
    }
}

/// Result of decoding a record's calldata. A failure is a value, not an absent field.
///
/// A decoded action serializes as the action itself; a failure as
/// `{"outcome": "unavailable", "reason": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ActionOutcome {
    Unavailable { reason: String },
    #[serde(untagged)]
    Decoded(DecodedAction),
}

impl ActionOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ActionOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn decoded(&self) -> Option<&DecodedAction> {
        match self {
            ActionOutcome::Decoded(action) => Some(action),
            ActionOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordInfo {
    pub status: TxStatus,
    pub action: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub info: RecordInfo,
}

/// Query flags for the all-transactions listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryFilter {
    pub executed: bool,
    pub queued: bool,
    pub trusted: bool,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            executed: false,
            queued: true,
            trusted: true,
        }
    }
}

impl HistoryFilter {
    pub fn query_string(&self) -> String {
        format!(
            "executed={}&queued={}&trusted={}",
            self.executed, self.queued, self.trusted
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeInfo {
    pub address: Address,
    #[serde(deserialize_with = "lenient::u64")]
    pub nonce: u64,
    #[serde(deserialize_with = "lenient::u64")]
    pub threshold: u64,
    pub owners: Vec<Address>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    #[serde(default)]
    pub signature: Option<Bytes>,
}

/// A multisig transaction as returned by the service's detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTransaction {
    pub safe: Address,
    pub to: Address,
    #[serde(deserialize_with = "lenient::u256")]
    pub value: U256,
    #[serde(default)]
    pub data: Option<Bytes>,
    pub operation: Operation,
    #[serde(default, deserialize_with = "lenient::u256")]
    pub safe_tx_gas: U256,
    #[serde(default, deserialize_with = "lenient::u256")]
    pub base_gas: U256,
    #[serde(default, deserialize_with = "lenient::u256")]
    pub gas_price: U256,
    #[serde(default, deserialize_with = "lenient::address")]
    pub gas_token: Address,
    #[serde(default, deserialize_with = "lenient::address")]
    pub refund_receiver: Address,
    #[serde(deserialize_with = "lenient::u64")]
    pub nonce: u64,
    pub safe_tx_hash: B256,
    #[serde(default)]
    pub confirmations_required: u64,
    #[serde(default)]
    pub confirmations: Vec<Confirmation>,
    #[serde(default)]
    pub is_executed: bool,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

impl ServiceTransaction {
    pub fn draft(&self) -> SafeTxDraft {
        SafeTxDraft {
            to: self.to,
            value: self.value,
            data: self.data.clone().unwrap_or_default(),
            operation: self.operation,
        }
    }
}

/// Body of a multisig transaction proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRequest {
    pub to: Address,
    #[serde(serialize_with = "amount::serialize")]
    pub value: U256,
    pub data: Option<Bytes>,
    pub operation: Operation,
    #[serde(serialize_with = "amount::serialize")]
    pub safe_tx_gas: U256,
    #[serde(serialize_with = "amount::serialize")]
    pub base_gas: U256,
    #[serde(serialize_with = "amount::serialize")]
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: u64,
    pub contract_transaction_hash: B256,
    pub sender: Address,
    pub signature: Bytes,
    pub origin: Option<String>,
}

impl ProposalRequest {
    pub fn new(
        draft: &SafeTxDraft,
        nonce: u64,
        safe_tx_hash: B256,
        sender: Address,
        signature: Bytes,
    ) -> Self {
        Self {
            to: draft.to,
            value: draft.value,
            data: (!draft.data.is_empty()).then(|| draft.data.clone()),
            operation: draft.operation,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce,
            contract_transaction_hash: safe_tx_hash,
            sender,
            signature,
            origin: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeOutcome {
    Proposed(B256),
    AlreadyProposed(B256),
}

impl ProposeOutcome {
    pub fn safe_tx_hash(&self) -> B256 {
        match self {
            ProposeOutcome::Proposed(hash) | ProposeOutcome::AlreadyProposed(hash) => *hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleProposal {
    pub safe_tx_hash: B256,
    pub safe_address: Address,
    pub schedule_id: B256,
    #[serde(serialize_with = "amount::serialize")]
    pub execution_time: U256,
    pub token_address: Address,
    #[serde(serialize_with = "amount::serialize")]
    pub amount_total: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub is_success: bool,
    pub tx_hash: Option<B256>,
    pub message: String,
}

/// What the caller needs to run a queued timelock schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleExecution {
    pub safe_tx_hash: B256,
    pub schedule_id: B256,
    pub token: Option<Address>,
    pub amount_total: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExecutionResult {
    pub msg_error: Option<String>,
    pub executed_tx_hash: Option<B256>,
    pub schedule_id: B256,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerChange {
    Add(Address),
    Remove(Address),
}

/// Decimal rendering for on-chain amounts.
pub(crate) mod amount {
    use alloy::primitives::U256;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn serialize_all<S: Serializer>(
        values: &[U256],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(ToString::to_string))
    }
}

/// The service is inconsistent about quoting numbers; accept both.
mod lenient {
    use std::str::FromStr;

    use alloy::primitives::{Address, U256};
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }

    pub fn u256<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(U256::from(n)),
            NumberOrString::String(s) => U256::from_str(s.trim()).map_err(D::Error::custom),
        }
    }

    pub fn address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        Ok(Option::<Address>::deserialize(deserializer)?.unwrap_or(Address::ZERO))
    }

    /// Strings as-is, other scalars in their JSON rendering, `null` as `None`.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    /// An address when the value parses as one, otherwise `None`.
    pub fn maybe_address<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Address>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Address::from_str(s.trim()).ok(),
            _ => None,
        })
    }
}
