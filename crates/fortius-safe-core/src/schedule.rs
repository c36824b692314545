use std::slice;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, B256, U256};

use crate::decoder::DecodeError;
use crate::domain::ScheduleAction;

/// Builds a [`ScheduleAction`] from the decoded `schedule` arguments.
///
/// A scalar recipient or value is treated as a one-element list; list inputs
/// pass through untouched. Recipients and values must pair up one to one.
pub fn normalize_schedule(args: &[DynSolValue]) -> Result<ScheduleAction, DecodeError> {
    let [token, recipients, values, timestamp, escrow, cancellable, salt] = args else {
        return Err(DecodeError::ScheduleShape(format!(
            "expected 7 arguments, got {}",
            args.len()
        )));
    };

    let recipients = as_list(recipients)
        .iter()
        .map(|v| expect_address(v, "recipients"))
        .collect::<Result<Vec<_>, _>>()?;
    let values = as_list(values)
        .iter()
        .map(|v| expect_uint(v, "values"))
        .collect::<Result<Vec<_>, _>>()?;

    if recipients.len() != values.len() {
        return Err(DecodeError::ScheduleShape(format!(
            "{} recipients but {} values",
            recipients.len(),
            values.len()
        )));
    }

    Ok(ScheduleAction {
        token: expect_address(token, "token")?,
        recipients,
        values,
        timestamp: expect_uint(timestamp, "timestamp")?,
        escrow: expect_bool(escrow, "escrow")?,
        cancellable: expect_bool(cancellable, "cancellable")?,
        salt: expect_word(salt, "salt")?,
    })
}

fn as_list(value: &DynSolValue) -> &[DynSolValue] {
    match value {
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => items,
        scalar => slice::from_ref(scalar),
    }
}

fn shape_error(field: &str, value: &DynSolValue) -> DecodeError {
    DecodeError::ScheduleShape(format!("unexpected {field} value {value:?}"))
}

fn expect_address(value: &DynSolValue, field: &str) -> Result<Address, DecodeError> {
    value.as_address().ok_or_else(|| shape_error(field, value))
}

fn expect_uint(value: &DynSolValue, field: &str) -> Result<U256, DecodeError> {
    match value {
        DynSolValue::Uint(v, _) => Ok(*v),
        other => Err(shape_error(field, other)),
    }
}

fn expect_bool(value: &DynSolValue, field: &str) -> Result<bool, DecodeError> {
    value.as_bool().ok_or_else(|| shape_error(field, value))
}

fn expect_word(value: &DynSolValue, field: &str) -> Result<B256, DecodeError> {
    match value {
        DynSolValue::FixedBytes(word, 32) => Ok(*word),
        other => Err(shape_error(field, other)),
    }
}
