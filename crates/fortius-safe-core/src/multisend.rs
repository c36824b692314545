//! Packed `multiSend(bytes)` payloads.
//!
//! Each call is `operation (1) ++ to (20) ++ value (32) ++ dataLength (32) ++ data`.

use alloy::primitives::{Address, Bytes, U256};

use crate::decoder::DecodeError;
use crate::domain::{MultiSendCall, SafeTxDraft};

pub const MULTISEND_SELECTOR: &str = "0x8d80ff0a";

pub fn unpack(packed: &[u8]) -> Result<Vec<MultiSendCall>, DecodeError> {
    let mut calls = Vec::new();
    let mut offset = 0;

    while offset < packed.len() {
        let operation = packed[offset];
        offset += 1;

        let to = Address::from_slice(take(packed, offset, 20, "to")?);
        offset += 20;

        let value = U256::from_be_slice(take(packed, offset, 32, "value")?);
        offset += 32;

        let data_length = U256::from_be_slice(take(packed, offset, 32, "dataLength")?);
        offset += 32;
        let data_length = usize::try_from(data_length).map_err(|_| {
            DecodeError::MultiSend(format!(
                "call {} declares an oversized data length",
                calls.len()
            ))
        })?;

        let data = Bytes::copy_from_slice(take(packed, offset, data_length, "data")?);
        offset += data_length;

        calls.push(MultiSendCall {
            operation,
            to,
            value,
            data,
        });
    }

    Ok(calls)
}

fn take<'a>(
    packed: &'a [u8],
    offset: usize,
    len: usize,
    field: &str,
) -> Result<&'a [u8], DecodeError> {
    offset
        .checked_add(len)
        .and_then(|end| packed.get(offset..end))
        .ok_or_else(|| DecodeError::MultiSend(format!("incomplete call: missing '{field}'")))
}

pub fn pack(calls: &[SafeTxDraft]) -> Bytes {
    let mut packed = Vec::new();
    for call in calls {
        packed.push(u8::from(call.operation));
        packed.extend_from_slice(call.to.as_slice());
        packed.extend_from_slice(&call.value.to_be_bytes::<32>());
        packed.extend_from_slice(&U256::from(call.data.len()).to_be_bytes::<32>());
        packed.extend_from_slice(&call.data);
    }
    packed.into()
}
