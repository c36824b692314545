//! Domain layer for Fortius Safe accounts: queue decoding, timelock schedule
//! normalization and Safe transaction builders. No I/O happens here; the
//! network is reached through the traits in [`ports`].

pub mod builders;
pub mod decoder;
pub mod domain;
pub mod history;
pub mod multisend;
pub mod ports;
pub mod registry;
pub mod remote;
pub mod schedule;

pub use builders::BuildError;
pub use decoder::{
    decode_local, decode_schedule, CalldataDecoder, DecodeError, DecoderConfig,
    DEFAULT_DELEGATION_TARGET,
};
pub use domain::{
    ActionOutcome, AnnotatedRecord, Confirmation, DecodedAction, DecodedParam, ExecutionResult,
    HistoryFilter, MultiSendCall, Operation, OwnerChange, ProposalRequest, ProposeOutcome,
    RecordInfo, SafeInfo, SafeTxDraft, ScheduleAction, ScheduleExecution,
    ScheduleExecutionResult, ScheduleProposal, ServiceTransaction, TransactionRecord,
    TransferLeg, TransferRequest, TxStatus,
};
pub use domain::non_empty_calldata;
pub use history::{annotate, assemble_history, try_assemble_history};
pub use ports::{ChainPort, OwnerSigner, PortError, SafeServicePort, TxHistoryPort};
pub use registry::{RegistryError, SelectorEntry, SelectorRegistry};
pub use remote::{convert_for_display, decode_via_service, DataDecoded, RemoteAction};
