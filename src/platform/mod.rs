//! Platform abstraction layer
//!
//! This module provides platform-specific implementations for:
//! - Reading the host OS version (picks Music vs. iTunes)
//! - Detecting if the player app is running

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(not(target_os = "macos"))]
pub mod other;

/// Platform-specific operations
pub trait Platform {
    /// Get the host OS version as `(major, minor)`
    fn os_version() -> Option<(u32, u32)>;

    /// Check if an app with the given bundle identifier is running
    fn is_app_running(bundle_identifier: &str) -> bool;

    /// Get the platform name for logging
    fn name() -> &'static str;
}

/// Get the current platform implementation
#[cfg(target_os = "macos")]
pub use macos::MacOSPlatform as CurrentPlatform;

#[cfg(not(target_os = "macos"))]
pub use other::UnsupportedPlatform as CurrentPlatform;

/// Get the host OS version for the current platform
pub fn os_version() -> Option<(u32, u32)> {
    CurrentPlatform::os_version()
}

/// Check if the given app is running on the current platform
pub fn is_app_running(bundle_identifier: &str) -> bool {
    CurrentPlatform::is_app_running(bundle_identifier)
}

/// Platform name for logging
pub fn name() -> &'static str {
    CurrentPlatform::name()
}

/// Parse a dotted version string such as `10.14.6` or `15` into `(major, minor)`.
pub fn parse_version(raw: &str) -> Option<(u32, u32)> {
    let mut parts = raw.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}
