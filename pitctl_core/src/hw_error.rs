//! Maps `Box<dyn Error>` from trait boundaries to typed `CoreError`.
//!
//! The traits in `pitctl_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum.

use crate::error::CoreError;

/// Map a port-boundary error to a typed `CoreError`.
pub fn map_port_error(e: &(dyn std::error::Error + 'static)) -> CoreError {
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("i/o") || lower.contains("file") || lower.contains("storage") {
        CoreError::Storage(s)
    } else {
        CoreError::Hardware(s)
    }
}
