//! Fallback for hosts without Music.app
//!
//! Lets the library and the debug binary build everywhere. The player is
//! never reported as running, so every query resolves to the idle payload.

use super::Platform;

/// Non-macOS platform implementation (stub)
pub struct UnsupportedPlatform;

impl Platform for UnsupportedPlatform {
    fn os_version() -> Option<(u32, u32)> {
        None
    }

    fn is_app_running(_bundle_identifier: &str) -> bool {
        false
    }

    fn name() -> &'static str {
        std::env::consts::OS
    }
}
