//! Media player integration targets
//!
//! Music replaced iTunes in macOS 10.15 Catalina. Both apps expose the same
//! scripting dictionary and post `<bundle id>.playerInfo` on every state
//! change, so the only things that differ are the bundle identifier and the
//! Discord art asset.

use log::debug;

use crate::platform;

/// Which media player app the host ships
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCapability {
    /// macOS 10.15 and later: Music.app
    MusicApp,
    /// macOS 10.14 and earlier: iTunes
    LegacyITunes,
}

impl HostCapability {
    /// Classify a macOS version.
    pub fn from_os_version(major: u32, minor: u32) -> Self {
        if (major, minor) >= (10, 15) {
            Self::MusicApp
        } else {
            Self::LegacyITunes
        }
    }

    /// Probe the running host. Defaults to Music when the version can't be read.
    pub fn probe() -> Self {
        match platform::os_version() {
            Some((major, minor)) => {
                let capability = Self::from_os_version(major, minor);
                debug!("{} {major}.{minor} -> {capability:?}", platform::name());
                capability
            }
            None => {
                debug!("OS version unavailable, assuming Music.app");
                Self::MusicApp
            }
        }
    }
}

/// The player app to watch and the Discord asset to show for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationTarget {
    /// Bundle identifier, also the prefix of the change notification
    pub application_identifier: &'static str,

    /// Large image asset key registered with the Discord application
    pub image_asset_key: &'static str,

    /// User-facing name of the player
    pub display_name: &'static str,
}

/// Suffix of the distributed notification posted on every player change
const PLAYER_INFO_SUFFIX: &str = "playerInfo";

pub const MUSIC: IntegrationTarget = IntegrationTarget {
    application_identifier: "com.apple.Music",
    image_asset_key: "music_logo",
    display_name: "Music",
};

pub const ITUNES: IntegrationTarget = IntegrationTarget {
    application_identifier: "com.apple.iTunes",
    image_asset_key: "itunes_logo",
    display_name: "iTunes",
};

/// Capability -> target lookup
const TARGETS: &[(HostCapability, IntegrationTarget)] = &[
    (HostCapability::MusicApp, MUSIC),
    (HostCapability::LegacyITunes, ITUNES),
];

impl IntegrationTarget {
    /// Look up the target for a host capability.
    pub fn for_capability(capability: HostCapability) -> &'static Self {
        TARGETS
            .iter()
            .find(|(c, _)| *c == capability)
            .map_or(&MUSIC, |(_, target)| target)
    }

    /// Probe the host and pick the matching target.
    pub fn select() -> &'static Self {
        Self::for_capability(HostCapability::probe())
    }

    /// Name of the distributed notification the player posts on changes.
    pub fn notification_name(&self) -> String {
        format!("{}.{PLAYER_INFO_SUFFIX}", self.application_identifier)
    }
}
