//! Apple Music / iTunes presence reader
//!
//! This crate reads the track currently loaded in Music (or iTunes on older
//! macOS releases) and turns it into a Discord Rich Presence payload. The
//! menu bar binary wires it to a tray icon and the player's distributed
//! `playerInfo` notification.

use serde::{Deserialize, Serialize};

pub mod bridge;
pub mod client;
pub mod notifications;
pub mod platform;
pub mod presence;
pub mod target;
pub mod tray;
pub mod util;
pub mod watcher;

pub use bridge::{OsaScriptBridge, PlayerBridge};
pub use client::{DiscordPresenceClient, PresenceClient};
pub use presence::{PresencePayload, Timestamps};
pub use target::IntegrationTarget;
pub use watcher::{StatusWatcher, WatcherEvent, WatcherHandle};

/// Playback state as reported by the player
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    /// Anything else the player reports (fast forwarding, rewinding, ...)
    Unknown,
}

impl PlaybackState {
    /// Parse the player's `player state` property as printed by AppleScript.
    ///
    /// Returns `None` for empty output, which is how an absent state shows up.
    pub fn from_script_output(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "playing" => Some(Self::Playing),
            "paused" => Some(Self::Paused),
            "stopped" => Some(Self::Stopped),
            _ => Some(Self::Unknown),
        }
    }
}

/// The track currently loaded in the player.
///
/// The scripting bridge exposes every field as independently optional, but in
/// practice they are all present or all absent together, so the whole record
/// is modelled as one `Option<TrackInfo>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrackInfo {
    pub name: String,
    pub album: String,
    pub artist: String,

    /// Track length in seconds
    pub duration_seconds: f64,

    /// Player position sampled together with the track metadata
    pub position_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_known_values() {
        assert_eq!(
            PlaybackState::from_script_output("playing\n"),
            Some(PlaybackState::Playing)
        );
        assert_eq!(
            PlaybackState::from_script_output("paused"),
            Some(PlaybackState::Paused)
        );
        assert_eq!(
            PlaybackState::from_script_output(" stopped "),
            Some(PlaybackState::Stopped)
        );
    }

    #[test]
    fn test_playback_state_other_values_are_unknown() {
        assert_eq!(
            PlaybackState::from_script_output("fast forwarding"),
            Some(PlaybackState::Unknown)
        );
        assert_eq!(
            PlaybackState::from_script_output("rewinding"),
            Some(PlaybackState::Unknown)
        );
    }

    #[test]
    fn test_playback_state_empty_is_absent() {
        assert_eq!(PlaybackState::from_script_output(""), None);
        assert_eq!(PlaybackState::from_script_output("\n"), None);
    }
}
