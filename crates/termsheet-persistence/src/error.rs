//! Persistence error types.
//!
//! Every failure carries a message fit for the notice shown to the user and,
//! where there is one, a hint on how to recover.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not a draft file, or a draft file with a broken envelope.
    #[error("Invalid draft file format")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Draft file version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    /// Stored values no longer match the checksum written with them.
    #[error("Draft checksum mismatch: {path}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Failed to serialize draft values")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to deserialize draft values")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Temp file was written but could not replace the draft.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing store refused the operation.
    #[error("Draft storage unavailable: {reason}")]
    Unavailable { reason: String },
}

impl PersistenceError {
    /// Message suitable for a user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the draft at {}", operation, path.display())
            }
            Self::InvalidFormat { path, reason } => {
                format!(
                    "The file at {} is not a term sheet draft: {}",
                    path.display(),
                    reason
                )
            }
            Self::UnsupportedVersion {
                found,
                max_supported,
                ..
            } => {
                format!(
                    "This draft was written by a newer version (draft version {}, \
                    this version reads up to {}).",
                    found, max_supported
                )
            }
            Self::ChecksumMismatch { path, .. } => {
                format!(
                    "The draft '{}' was modified outside the form and cannot be trusted.",
                    path.file_name()
                        .and_then(std::ffi::OsStr::to_str)
                        .unwrap_or("unknown")
                )
            }
            Self::Serialization { .. } => "An error occurred while saving the draft.".to_string(),
            Self::Deserialization { .. } => {
                "An error occurred while reading the draft. The file may be corrupted.".to_string()
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the draft to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
            Self::Unavailable { reason } => format!("Draft storage is unavailable: {reason}"),
        }
    }

    /// How the user might resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the draft exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidFormat { .. } => Some("Make sure you selected a draft (.json) file.".into()),
            Self::UnsupportedVersion { .. } => Some("Update to the latest version.".into()),
            Self::ChecksumMismatch { .. } | Self::Deserialization { .. } => {
                Some("Start a new form or restore the draft from a backup.".into())
            }
            Self::Serialization { .. } => None,
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or choose a different draft location.".into())
            }
            Self::Unavailable { .. } => Some("Try again later.".into()),
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
