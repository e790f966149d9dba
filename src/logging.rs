//! ## Logging Configuration
//!
//! This module sets up logging automatically at program startup using the `ctor` crate.
//! Logging behavior is controlled by the `DEBUG_TAXI_DASHBOARD` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no logging will be initialized.
//! - **Enabled**: Any other value enables logging with a maximum log level of `DEBUG`.
//!
//! The command-line binary installs its own `RUST_LOG`-driven subscriber and only does so
//! when this hook has not already claimed the global default.
//!
//! ```sh
//! export DEBUG_TAXI_DASHBOARD=true
//! ```

use ctor::ctor;
use tracing::Level;

/// Environment variable that turns on library debug logging.
pub const DEBUG_ENV_VAR: &str = "DEBUG_TAXI_DASHBOARD";

/// Returns true when the given value of [`DEBUG_ENV_VAR`] leaves logging off.
pub(crate) fn is_disabled(value: Option<&str>) -> bool {
    value.map_or(true, |v| v == "0" || v == "false" || v.is_empty())
}

#[ctor]
fn set_debug_level() {
    let value = std::env::var(DEBUG_ENV_VAR).ok();
    if !is_disabled(value.as_deref()) {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_values() {
        assert!(is_disabled(None));
        assert!(is_disabled(Some("")));
        assert!(is_disabled(Some("0")));
        assert!(is_disabled(Some("false")));
        assert!(!is_disabled(Some("1")));
        assert!(!is_disabled(Some("true")));
    }
}
