//! macOS platform implementation
//!
//! Provides macOS-specific functionality for player detection.

use super::Platform;
use crate::util;
use log::debug;
use objc2_app_kit::NSRunningApplication;
use objc2_foundation::NSString;
use std::process::Command;

/// macOS platform implementation
pub struct MacOSPlatform;

impl Platform for MacOSPlatform {
    fn os_version() -> Option<(u32, u32)> {
        let output = util::run_command_with_timeout(
            Command::new("sw_vers").arg("-productVersion"),
            util::DEFAULT_COMMAND_TIMEOUT,
        )
        .map_err(|e| debug!("sw_vers failed: {e}"))
        .ok()?;

        if !output.status.success() {
            return None;
        }

        super::parse_version(&String::from_utf8_lossy(&output.stdout))
    }

    fn is_app_running(bundle_identifier: &str) -> bool {
        let bundle_identifier = NSString::from_str(bundle_identifier);
        // Does not launch the app, unlike addressing it through Apple Events.
        #[allow(unused_unsafe)]
        let running =
            unsafe { NSRunningApplication::runningApplicationsWithBundleIdentifier(&bundle_identifier) };
        running.count() > 0
    }

    fn name() -> &'static str {
        "macOS"
    }
}
