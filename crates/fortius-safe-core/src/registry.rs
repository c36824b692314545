//! Selector table for calldata the Fortius contracts emit.
//!
//! The table is a JSON array of `{typeDecode, abi, actionType}` entries. Each
//! entry's declared selector is checked against the keccak selector of its
//! function fragment when the table is loaded, so a mistyped row fails fast
//! instead of silently never matching.

use std::collections::HashMap;
use std::sync::LazyLock;

use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::hex;
use serde::Deserialize;
use thiserror::Error;

const BUILTIN_TABLE: &str = include_str!("selectors.json");

static BUILTIN: LazyLock<SelectorRegistry> = LazyLock::new(|| {
    SelectorRegistry::from_json(BUILTIN_TABLE).expect("built-in selector table is valid")
});

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid selector table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("selector {0} has no function fragment")]
    MissingFunction(String),
    #[error("selector {declared} does not match fragment {signature} ({computed})")]
    SelectorMismatch {
        declared: String,
        computed: String,
        signature: String,
    },
    #[error("selector {0} is registered twice")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorEntry {
    pub selector: String,
    pub function: Function,
    pub action_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRow {
    type_decode: String,
    abi: JsonAbi,
    action_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct SelectorRegistry {
    entries: HashMap<String, SelectorEntry>,
}

impl SelectorRegistry {
    /// The table shipped with the crate: timelock `schedule` and `multiSend`.
    pub fn builtin() -> &'static SelectorRegistry {
        &BUILTIN
    }

    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let rows: Vec<TableRow> = serde_json::from_str(raw)?;
        let mut registry = Self::default();
        for row in rows {
            let function = row
                .abi
                .functions()
                .next()
                .cloned()
                .ok_or_else(|| RegistryError::MissingFunction(row.type_decode.clone()))?;
            registry.insert(&row.type_decode, function, row.action_type)?;
        }
        Ok(registry)
    }

    pub fn insert(
        &mut self,
        selector: &str,
        function: Function,
        action_type: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let declared = normalize_selector(selector);
        let computed = hex::encode_prefixed(function.selector());
        if declared != computed {
            return Err(RegistryError::SelectorMismatch {
                declared,
                computed,
                signature: function.signature(),
            });
        }
        if self.entries.contains_key(&declared) {
            return Err(RegistryError::Duplicate(declared));
        }

        self.entries.insert(
            declared.clone(),
            SelectorEntry {
                selector: declared,
                function,
                action_type: action_type.into(),
            },
        );
        Ok(())
    }

    pub fn lookup(&self, selector: &str) -> Option<&SelectorEntry> {
        self.entries.get(&normalize_selector(selector))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lower-cases and `0x`-prefixes a selector for map lookups.
pub fn normalize_selector(selector: &str) -> String {
    let trimmed = selector.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", body.to_ascii_lowercase())
}
