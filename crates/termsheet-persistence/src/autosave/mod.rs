//! Auto-save support.
//!
//! Provides:
//! - `DirtyTracker` - Tracks unsaved edits against an injected clock
//! - `AutoSaveConfig` - Debounce and maximum-delay settings

mod config;
mod tracker;

pub use config::AutoSaveConfig;
pub use tracker::DirtyTracker;
