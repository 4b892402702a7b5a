//! JSON document adapter.
//!
//! Incoming documents are flat objects of key -> value. Values of any JSON
//! type are stored as text (see [`crate::value`]). An optional member named
//! [`RESERVED_DESCRIPTIONS_KEY`] carries per-key descriptions:
//!
//! ```json
//! { "a": "apple", "b": 2, "entryDescriptions": { "a": "first letter" } }
//! ```

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{LedgerError, Result};
use crate::model::{EntryBatch, Ledger, NewEntry};
use crate::value::EntryValue;

/// Member holding per-key descriptions. Never stored as an entry itself.
pub const RESERVED_DESCRIPTIONS_KEY: &str = "entryDescriptions";

/// Decode a JSON document into an ordered entry batch.
///
/// # Errors
///
/// Returns `LedgerError::InvalidInput` if the text is not valid JSON, the
/// top-level value is not an object, or the descriptions member is not an
/// object of strings.
pub fn decode(text: &str) -> Result<EntryBatch> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| LedgerError::InvalidInput(format!("Malformed JSON document: {}", e)))?;

    let members = match document {
        Value::Object(members) => members,
        other => {
            return Err(LedgerError::InvalidInput(format!(
                "JSON document must be an object, found {}",
                json_kind(&other)
            )))
        }
    };

    let descriptions = match members.get(RESERVED_DESCRIPTIONS_KEY) {
        Some(value) => decode_descriptions(value)?,
        None => HashMap::new(),
    };

    let mut batch = EntryBatch::new();
    for (key, value) in members
        .iter()
        .filter(|(key, _)| key.as_str() != RESERVED_DESCRIPTIONS_KEY)
    {
        let mut entry = NewEntry::new(key.clone(), value.to_entry_value());
        entry.description = descriptions.get(key).cloned();
        batch.push(entry);
    }

    Ok(batch)
}

fn decode_descriptions(value: &Value) -> Result<HashMap<String, String>> {
    let object = value.as_object().ok_or_else(|| {
        LedgerError::InvalidInput(format!(
            "'{}' must be an object, found {}",
            RESERVED_DESCRIPTIONS_KEY,
            json_kind(value)
        ))
    })?;

    object
        .iter()
        .map(|(key, description)| match description {
            Value::String(text) => Ok((key.clone(), text.clone())),
            other => Err(LedgerError::InvalidInput(format!(
                "Description for '{}' must be a string, found {}",
                key,
                json_kind(other)
            ))),
        })
        .collect()
}

/// Encode a ledger's active entries as a JSON object, keys sorted.
pub fn encode(ledger: &Ledger, pretty: bool) -> Result<String> {
    let members: Map<String, Value> = ledger
        .active_map()
        .into_iter()
        .map(|(key, value)| (key, value.map_or(Value::Null, Value::String)))
        .collect();
    let document = Value::Object(members);

    let text = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(text)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
