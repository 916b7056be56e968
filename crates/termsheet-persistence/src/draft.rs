//! Draft file envelope and the JSON file store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use termsheet_model::FieldSnapshot;

use crate::error::Result;
use crate::io::{load_draft, save_draft, snapshot_checksum};
use crate::store::FormPersistence;

/// Value of the `format` field identifying a draft file.
pub const DRAFT_FORMAT: &str = "termsheet-draft";

/// Newest envelope version this build reads and the one it writes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// On-disk draft: the saved snapshot plus what is needed to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftFile {
    pub format: String,
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    /// Hex SHA-256 of the serialized `values`.
    pub checksum: String,
    pub values: FieldSnapshot,
}

impl DraftFile {
    pub fn new(values: FieldSnapshot, saved_at: DateTime<Utc>) -> Result<Self> {
        let checksum = snapshot_checksum(&values)?;
        Ok(Self {
            format: DRAFT_FORMAT.to_string(),
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at,
            checksum,
            values,
        })
    }
}

/// Stores the form draft as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonDraftStore {
    path: PathBuf,
}

impl JsonDraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FormPersistence for JsonDraftStore {
    fn save(&mut self, snapshot: &FieldSnapshot) -> Result<()> {
        let draft = DraftFile::new(snapshot.clone(), Utc::now())?;
        save_draft(&draft, &self.path)
    }

    fn load(&mut self) -> Result<Option<FieldSnapshot>> {
        if !self.path.exists() {
            tracing::debug!("No draft at {}", self.path.display());
            return Ok(None);
        }
        load_draft(&self.path).map(|draft| Some(draft.values))
    }
}
