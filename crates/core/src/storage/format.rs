use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::ledger::Ledger;

/// Current ledger file format version.
pub const CURRENT_VERSION: u16 = 1;

/// On-disk envelope around the ledger.
///
/// Layout:
/// ```text
/// { "formatVersion": 1, "ledger": { "transactions": [...], "archives": [...] } }
/// ```
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerFile<L> {
    format_version: u16,
    ledger: L,
}

/// Encode a ledger as pretty-printed JSON bytes.
pub fn write_ledger(ledger: &Ledger) -> Result<Vec<u8>, CoreError> {
    let file = LedgerFile {
        format_version: CURRENT_VERSION,
        ledger,
    };
    serde_json::to_vec_pretty(&file)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize ledger: {e}")))
}

/// Decode ledger bytes, checking the envelope before the contents.
pub fn read_ledger(data: &[u8]) -> Result<Ledger, CoreError> {
    let value: serde_json::Value = serde_json::from_slice(data)
        .map_err(|e| CoreError::InvalidFileFormat(format!("Ledger file is not JSON: {e}")))?;

    let version = value
        .get("formatVersion")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CoreError::InvalidFileFormat("Missing 'formatVersion' field".into()))?;
    let version = u16::try_from(version)
        .map_err(|_| CoreError::InvalidFileFormat(format!("Format version {version} out of range")))?;
    if version != CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let file: LedgerFile<Ledger> = serde_json::from_value(value)
        .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize ledger: {e}")))?;
    Ok(file.ledger)
}
