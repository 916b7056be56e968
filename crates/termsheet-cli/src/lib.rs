//! Library side of the term sheet CLI: logging setup and edit-script replay.

pub mod logging;
pub mod script;
