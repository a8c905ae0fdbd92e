//! Player state -> Rich Presence payload
//!
//! [`build_payload`] is a pure function of the bridge results and the
//! wall clock, so it is tested directly with fixed clocks.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::target::IntegrationTarget;
use crate::{PlaybackState, TrackInfo};

pub const IDLE_DETAILS: &str = "Nothing's playing.";
pub const IDLE_STATE: &str = "(why are you looking at my status anyway?)";

pub const PAUSED_DETAILS: &str = "Paused.";
pub const PAUSED_STATE: &str = "Holding your spot in the beat.";

pub const STOPPED_DETAILS: &str = "Music is stopped.";
pub const STOPPED_STATE: &str = "Nothing's happening.";

pub const UNKNOWN_DETAILS: &str = "Music is most likely closed.";
pub const UNKNOWN_STATE: &str = "If so, please quit this app. If not, please file a bug.";

pub const LOADING_DETAILS: &str = "Loading.";

/// Shown instead of an empty track name
pub const UNTITLED_TRACK: &str = "Unknown track";

/// Start and end of the playing track, in milliseconds since the Unix epoch.
///
/// Only ever present as a pair.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Timestamps {
    pub start: i64,
    pub end: i64,
}

/// What gets shown on the Discord profile
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PresencePayload {
    details: String,
    state: String,
    large_image: Option<String>,
    timestamps: Option<Timestamps>,
}

impl PresencePayload {
    /// A text-only payload, no art and no progress bar
    fn text(details: &str, state: &str) -> Self {
        Self {
            details: details.to_string(),
            state: state.to_string(),
            large_image: None,
            timestamps: None,
        }
    }

    /// Placeholder shown between connecting and the first real update
    pub fn loading(target: &IntegrationTarget) -> Self {
        Self::text(
            LOADING_DETAILS,
            &format!("Getting details from {}...", target.display_name),
        )
    }

    /// Placeholder shown when no track is loaded (or the player can't be reached)
    pub fn idle() -> Self {
        Self::text(IDLE_DETAILS, IDLE_STATE)
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn large_image(&self) -> Option<&str> {
        self.large_image.as_deref()
    }

    pub fn timestamps(&self) -> Option<Timestamps> {
        self.timestamps
    }

    pub fn start_time(&self) -> Option<i64> {
        self.timestamps.map(|t| t.start)
    }

    pub fn end_time(&self) -> Option<i64> {
        self.timestamps.map(|t| t.end)
    }

    /// One-line summary for the tray menu
    pub fn summary(&self) -> String {
        format!("{}: {}", self.details, self.state)
    }
}

/// Map the player's state to a payload.
///
/// `position` is the playhead in seconds; only read when playing.
pub fn build_payload(
    target: &IntegrationTarget,
    track: Option<&TrackInfo>,
    state: Option<PlaybackState>,
    position: f64,
    now: SystemTime,
) -> PresencePayload {
    let Some(track) = track else {
        return PresencePayload::idle();
    };

    match state {
        Some(PlaybackState::Playing) => playing_payload(target, track, position, now),
        Some(PlaybackState::Paused) => PresencePayload::text(PAUSED_DETAILS, PAUSED_STATE),
        Some(PlaybackState::Stopped) => PresencePayload::text(STOPPED_DETAILS, STOPPED_STATE),
        Some(PlaybackState::Unknown) | None => {
            PresencePayload::text(UNKNOWN_DETAILS, UNKNOWN_STATE)
        }
    }
}

fn playing_payload(
    target: &IntegrationTarget,
    track: &TrackInfo,
    position: f64,
    now: SystemTime,
) -> PresencePayload {
    let details = if track.name.is_empty() {
        UNTITLED_TRACK.to_string()
    } else {
        track.name.clone()
    };

    PresencePayload {
        details,
        state: format!("{} - {}", track.album, track.artist),
        large_image: Some(target.image_asset_key.to_string()),
        timestamps: track_timestamps(track.duration_seconds, position, now),
    }
}

/// Progress bar bounds. Whole seconds only, so repeated notifications
/// during one track don't make the bar jitter.
///
/// `start` is `now - position`, `end` is `start + duration`, which is the
/// same instant as `now + (duration - position)`. Times too large to
/// represent in milliseconds get no progress bar.
fn track_timestamps(duration: f64, position: f64, now: SystemTime) -> Option<Timestamps> {
    let duration = whole_seconds(duration);
    let position = whole_seconds(position);

    // Streams have no length to count down to.
    if duration <= 0 {
        return None;
    }

    let start = epoch_millis(now).checked_sub(position.checked_mul(1000)?)?;
    let end = start.checked_add(duration.checked_mul(1000)?)?;
    Some(Timestamps { start, end })
}

/// Round half away from zero to whole seconds.
#[allow(clippy::cast_possible_truncation)]
fn whole_seconds(seconds: f64) -> i64 {
    seconds.round() as i64
}

/// Milliseconds since the Unix epoch (epoch seconds × 1000).
///
/// Clocks set before 1970 read as the epoch.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn epoch_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
