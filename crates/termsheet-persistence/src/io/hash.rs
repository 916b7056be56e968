//! Checksums over serialized snapshots.

use sha2::{Digest, Sha256};
use termsheet_model::FieldSnapshot;

use crate::error::{PersistenceError, Result};

/// Hex SHA-256 of the snapshot's JSON serialization.
///
/// Snapshots serialize in registration order, so equal snapshots always
/// produce equal checksums.
pub fn snapshot_checksum(values: &FieldSnapshot) -> Result<String> {
    let bytes =
        serde_json::to_vec(values).map_err(|source| PersistenceError::Serialization { source })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
