//! Draft loading.

use std::fs;
use std::path::Path;

use crate::draft::{CURRENT_SCHEMA_VERSION, DRAFT_FORMAT, DraftFile};
use crate::error::{PersistenceError, Result};
use crate::io::hash::snapshot_checksum;

/// Load and verify a draft file.
pub fn load_draft(path: &Path) -> Result<DraftFile> {
    let bytes = fs::read(path).map_err(|e| PersistenceError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_draft_bytes(&bytes, path)
}

/// Parse draft bytes, validating the envelope before trusting the values.
fn parse_draft_bytes(bytes: &[u8], path: &Path) -> Result<DraftFile> {
    let envelope: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: format!("not JSON ({e})"),
        })?;

    if envelope.get("format").and_then(serde_json::Value::as_str) != Some(DRAFT_FORMAT) {
        return Err(PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: format!("missing \"format\": \"{DRAFT_FORMAT}\" marker"),
        });
    }

    let version = envelope
        .get("schema_version")
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| PersistenceError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "missing schema version".to_string(),
        })?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_SCHEMA_VERSION,
            path: path.to_path_buf(),
        });
    }

    // Decode from the raw bytes: `Value` maps do not keep entry order.
    let draft: DraftFile =
        serde_json::from_slice(bytes).map_err(|source| PersistenceError::Deserialization {
            path: path.to_path_buf(),
            source,
        })?;

    let actual = snapshot_checksum(&draft.values)?;
    if actual != draft.checksum {
        return Err(PersistenceError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: draft.checksum,
            actual,
        });
    }

    tracing::info!(fields = draft.values.len(), "Loaded draft from {}", path.display());
    Ok(draft)
}
