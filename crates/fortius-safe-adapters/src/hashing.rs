use alloy::primitives::{hex, Address, B256, U256};

use fortius_safe_core::{PortError, SafeTxDraft};
use safe_hash::{tx_signing_hashes, TxInput};
use safe_utils::SafeWalletVersion;

/// EIP-712 `safeTxHash` of a draft with zeroed gas and refund fields.
pub fn safe_tx_hash(
    chain_id: u64,
    safe_address: Address,
    nonce: u64,
    safe_version: &str,
    draft: &SafeTxDraft,
) -> Result<B256, PortError> {
    let safe_version = SafeWalletVersion::parse(safe_version)
        .map_err(|e| PortError::Validation(format!("invalid safe version: {e}")))?;

    let tx = TxInput::new(
        draft.to,
        draft.value,
        hex::encode_prefixed(&draft.data),
        u8::from(draft.operation),
        U256::ZERO,
        U256::ZERO,
        U256::ZERO,
        Address::ZERO,
        Address::ZERO,
        String::new(),
    );

    Ok(tx_signing_hashes(&tx, safe_address, nonce, chain_id, safe_version).safe_tx_hash)
}
