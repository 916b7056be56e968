//! Redaction of field values in log output.
//!
//! Term sheet values are confidential deal terms. Log lines that carry a
//! value pass it through [`redact_value`], which only returns the value
//! once the host has opted in with [`set_log_values`].

use std::sync::atomic::{AtomicBool, Ordering};

static LOG_VALUES: AtomicBool = AtomicBool::new(false);

/// Placeholder written instead of a field value.
pub const REDACTED_VALUE: &str = "[REDACTED]";

pub fn set_log_values(enabled: bool) {
    LOG_VALUES.store(enabled, Ordering::Release);
}

pub fn log_values_enabled() -> bool {
    LOG_VALUES.load(Ordering::Relaxed)
}

/// The value itself when value logging is enabled, otherwise a fixed token.
pub fn redact_value(value: &str) -> &str {
    if log_values_enabled() {
        value
    } else {
        REDACTED_VALUE
    }
}
