//! Safe transaction drafts for the flows the handler exposes.

use alloy::primitives::{address, Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use thiserror::Error;

use crate::domain::{Operation, SafeTxDraft, ScheduleAction, ServiceTransaction, TransferRequest};
use crate::multisend;

sol! {
    interface ITimelockModule {
        function schedule(address token, address[] recipients, uint256[] values, uint256 timestamp, bool escrow, bool cancellable, bytes32 salt) external;
        function hashOperation(address safe, address token, address[] recipients, uint256[] values, uint256 timestamp, bool escrow, bool cancellable, bytes32 salt) external view returns (bytes32);
        function execute(address safe, bytes32 id) external;
    }

    interface IErc20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    interface ISafe {
        function addOwnerWithThreshold(address owner, uint256 threshold) external;
        function removeOwner(address prevOwner, address owner, uint256 threshold) external;
        function changeThreshold(uint256 threshold) external;
        function execTransaction(address to, uint256 value, bytes data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, bytes signatures) external payable returns (bool success);
    }

    interface IMultiSend {
        function multiSend(bytes transactions) external payable;
    }
}

/// Head of the Safe owner linked list.
pub const SENTINEL_OWNERS: Address = address!("0000000000000000000000000000000000000001");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("{0} is not an owner of the safe")]
    NotOwner(Address),
    #[error("threshold {threshold} is out of range for {owners} owners")]
    Threshold { threshold: u64, owners: usize },
    #[error("nothing to batch")]
    EmptyBatch,
    #[error("confirmation from {0} has no signature")]
    MissingSignature(Address),
}

pub fn schedule_call(module: Address, action: &ScheduleAction) -> SafeTxDraft {
    let call = ITimelockModule::scheduleCall {
        token: action.token,
        recipients: action.recipients.clone(),
        values: action.values.clone(),
        timestamp: action.timestamp,
        escrow: action.escrow,
        cancellable: action.cancellable,
        salt: action.salt,
    };
    SafeTxDraft::call(module, call.abi_encode())
}

pub fn hash_operation_calldata(safe: Address, action: &ScheduleAction) -> Bytes {
    ITimelockModule::hashOperationCall {
        safe,
        token: action.token,
        recipients: action.recipients.clone(),
        values: action.values.clone(),
        timestamp: action.timestamp,
        escrow: action.escrow,
        cancellable: action.cancellable,
        salt: action.salt,
    }
    .abi_encode()
    .into()
}

pub fn decode_hash_operation(output: &[u8]) -> Result<B256, alloy::sol_types::Error> {
    Ok(ITimelockModule::hashOperationCall::abi_decode_returns(output, true)?._0)
}

pub fn execute_schedule_calldata(safe: Address, schedule_id: B256) -> Bytes {
    ITimelockModule::executeCall {
        safe,
        id: schedule_id,
    }
    .abi_encode()
    .into()
}

/// One ERC-20 `transfer` per leg, or plain value transfers when `token` is `None`.
pub fn transfer_calls(token: Option<Address>, legs: &[TransferRequest]) -> Vec<SafeTxDraft> {
    legs.iter()
        .map(|leg| match token {
            Some(token) if token != Address::ZERO => SafeTxDraft::call(
                token,
                IErc20::transferCall {
                    to: leg.to,
                    amount: leg.amount,
                }
                .abi_encode(),
            ),
            _ => SafeTxDraft::native(leg.to, leg.amount),
        })
        .collect()
}

pub fn balance_of_calldata(owner: Address) -> Bytes {
    IErc20::balanceOfCall { owner }.abi_encode().into()
}

pub fn decode_balance_of(output: &[u8]) -> Result<U256, alloy::sol_types::Error> {
    Ok(IErc20::balanceOfCall::abi_decode_returns(output, true)?._0)
}

pub fn add_owner_call(safe: Address, owner: Address, threshold: u64) -> SafeTxDraft {
    SafeTxDraft::call(
        safe,
        ISafe::addOwnerWithThresholdCall {
            owner,
            threshold: U256::from(threshold),
        }
        .abi_encode(),
    )
}

/// `removeOwner` needs the owner preceding `owner` in the Safe's linked list.
pub fn remove_owner_call(
    safe: Address,
    owners: &[Address],
    owner: Address,
    threshold: u64,
) -> Result<SafeTxDraft, BuildError> {
    let index = owners
        .iter()
        .position(|o| *o == owner)
        .ok_or(BuildError::NotOwner(owner))?;
    let remaining = owners.len() - 1;
    if threshold == 0 || threshold as usize > remaining {
        return Err(BuildError::Threshold {
            threshold,
            owners: remaining,
        });
    }
    let prev_owner = match index {
        0 => SENTINEL_OWNERS,
        i => owners[i - 1],
    };

    Ok(SafeTxDraft::call(
        safe,
        ISafe::removeOwnerCall {
            prevOwner: prev_owner,
            owner,
            threshold: U256::from(threshold),
        }
        .abi_encode(),
    ))
}

pub fn change_threshold_call(safe: Address, threshold: u64) -> SafeTxDraft {
    SafeTxDraft::call(
        safe,
        ISafe::changeThresholdCall {
            threshold: U256::from(threshold),
        }
        .abi_encode(),
    )
}

/// Adds every owner with the current threshold, except the last which carries `new_threshold`.
pub fn invite_members_calls(
    safe: Address,
    owners: &[Address],
    current_threshold: u64,
    new_threshold: u64,
) -> Vec<SafeTxDraft> {
    let last = owners.len().saturating_sub(1);
    owners
        .iter()
        .enumerate()
        .map(|(i, owner)| {
            let threshold = if i == last {
                new_threshold
            } else {
                current_threshold
            };
            add_owner_call(safe, *owner, threshold)
        })
        .collect()
}

/// Zero-value self call that replaces whatever is queued at the same nonce.
pub fn rejection_tx(safe: Address) -> SafeTxDraft {
    SafeTxDraft::native(safe, U256::ZERO)
}

pub fn multisend_call(multisend_address: Address, calls: &[SafeTxDraft]) -> SafeTxDraft {
    let call = IMultiSend::multiSendCall {
        transactions: multisend::pack(calls),
    };
    SafeTxDraft {
        to: multisend_address,
        value: U256::ZERO,
        data: call.abi_encode().into(),
        operation: Operation::DelegateCall,
    }
}

/// A single call goes out as-is; several are wrapped in a `multiSend`.
pub fn batch(multisend_address: Address, mut calls: Vec<SafeTxDraft>) -> Result<SafeTxDraft, BuildError> {
    match calls.len() {
        0 => Err(BuildError::EmptyBatch),
        1 => Ok(calls.remove(0)),
        _ => Ok(multisend_call(multisend_address, &calls)),
    }
}

/// Concatenated owner signatures, ordered by ascending owner address as the Safe requires.
pub fn sorted_signatures(tx: &ServiceTransaction) -> Result<Bytes, BuildError> {
    let mut confirmations = tx
        .confirmations
        .iter()
        .map(|c| {
            c.signature
                .as_ref()
                .map(|sig| (c.owner, sig))
                .ok_or(BuildError::MissingSignature(c.owner))
        })
        .collect::<Result<Vec<_>, _>>()?;
    confirmations.sort_by_key(|(owner, _)| *owner);

    let mut packed = Vec::new();
    for (_, signature) in confirmations {
        packed.extend_from_slice(signature);
    }
    Ok(packed.into())
}

pub fn exec_transaction_calldata(tx: &ServiceTransaction, signatures: Bytes) -> Bytes {
    ISafe::execTransactionCall {
        to: tx.to,
        value: tx.value,
        data: tx.data.clone().unwrap_or_default(),
        operation: u8::from(tx.operation),
        safeTxGas: tx.safe_tx_gas,
        baseGas: tx.base_gas,
        gasPrice: tx.gas_price,
        gasToken: tx.gas_token,
        refundReceiver: tx.refund_receiver,
        signatures,
    }
    .abi_encode()
    .into()
}
