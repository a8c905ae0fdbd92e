//! Scripting bridge to the player app
//!
//! The watcher only needs three answers from the player: the loaded track,
//! the playback state and the playhead position. [`PlayerBridge`] is that
//! query surface; [`OsaScriptBridge`] answers it by running AppleScript
//! through `osascript` against the target's bundle identifier.
//!
//! # Failure modes
//!
//! - Player not running: reported as "no track" / "no state", never as an
//!   error, and the player is not launched.
//! - Automation permission denied (`-1743`): an error whose message tells the
//!   user where to grant access.
//! - Anything else `osascript` complains about: an error carrying stderr.

use anyhow::{bail, Context, Result};
use log::debug;
use std::process::Command;
use std::time::Duration;

use crate::target::IntegrationTarget;
use crate::{platform, util, PlaybackState, TrackInfo};

/// Query interface for the player's current state
pub trait PlayerBridge {
    /// The currently loaded track, or `None` if nothing is loaded.
    fn current_track(&self) -> Result<Option<TrackInfo>>;

    /// The player state, or `None` if the player doesn't report one.
    fn player_state(&self) -> Result<Option<PlaybackState>>;

    /// Playhead position in seconds.
    fn player_position(&self) -> Result<f64>;
}

/// AppleScript's rendering of an absent property
const MISSING_VALUE: &str = "missing value";

/// Error number for "Not authorized to send Apple events"
const AUTOMATION_DENIED: &str = "-1743";

/// Every field the bridge reads about a track, tab separated.
/// `current track` raises when nothing is loaded, which maps to empty output.
const TRACK_SCRIPT: &str = r"try
    set t to current track
on error
    return
end try
return (name of t as text) & tab & (album of t as text) & tab & (artist of t as text) & tab & (duration of t as text) & tab & (player position as text)";

const STATE_SCRIPT: &str = "return player state as text";

const POSITION_SCRIPT: &str = "return player position as text";

/// [`PlayerBridge`] backed by `osascript`
pub struct OsaScriptBridge {
    target: &'static IntegrationTarget,
    timeout: Duration,
}

impl OsaScriptBridge {
    /// Create a bridge that talks to the given player
    pub fn new(target: &'static IntegrationTarget) -> Self {
        Self {
            target,
            timeout: util::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Check if the player is running without launching it
    pub fn is_running(&self) -> bool {
        platform::is_app_running(self.target.application_identifier)
    }

    /// Run a script body against the player and return stdout.
    fn run_script(&self, body: &str) -> Result<String> {
        let script = guarded_script(self.target.application_identifier, body);

        let output = util::run_command_with_timeout(
            Command::new("osascript").args(["-e", &script]),
            self.timeout,
        )
        .context("Failed to run osascript")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains(AUTOMATION_DENIED) {
                bail!(
                    "Not allowed to control {}. Grant access in System Settings > \
                     Privacy & Security > Automation.",
                    self.target.display_name
                );
            }
            bail!("AppleScript failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PlayerBridge for OsaScriptBridge {
    fn current_track(&self) -> Result<Option<TrackInfo>> {
        if !self.is_running() {
            debug!("{} is not running", self.target.display_name);
            return Ok(None);
        }
        parse_track(&self.run_script(TRACK_SCRIPT)?)
    }

    fn player_state(&self) -> Result<Option<PlaybackState>> {
        if !self.is_running() {
            return Ok(None);
        }
        Ok(PlaybackState::from_script_output(
            &self.run_script(STATE_SCRIPT)?,
        ))
    }

    fn player_position(&self) -> Result<f64> {
        if !self.is_running() {
            bail!("{} is not running", self.target.display_name);
        }
        let output = self.run_script(POSITION_SCRIPT)?;
        if output.trim().is_empty() {
            bail!("{} is not running", self.target.display_name);
        }
        parse_seconds(&output)
    }
}

/// Wrap `body` in a `tell` block that only runs while the player is up.
///
/// `tell application` launches a player that isn't running, and the player
/// can quit between [`OsaScriptBridge::is_running`] and the script, so the
/// check is repeated inside the script. A skipped body prints nothing.
pub fn guarded_script(bundle_identifier: &str, body: &str) -> String {
    format!(
        "if application id \"{bundle_identifier}\" is running then\n\
         tell application id \"{bundle_identifier}\"\n\
         {body}\n\
         end tell\n\
         end if"
    )
}

/// Parse the tab-separated output of the track script.
pub fn parse_track(raw: &str) -> Result<Option<TrackInfo>> {
    let line = raw.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    let [name, album, artist, duration, position] = fields.as_slice() else {
        bail!("Expected 5 track fields, got {}: {line:?}", fields.len());
    };

    Ok(Some(TrackInfo {
        name: text_field(name),
        album: text_field(album),
        artist: text_field(artist),
        duration_seconds: optional_seconds(duration)?,
        position_seconds: optional_seconds(position)?,
    }))
}

/// Parse a number of seconds as printed by AppleScript.
///
/// AppleScript formats reals with the user's locale, so `200,4` is accepted
/// alongside `200.4`.
pub fn parse_seconds(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let seconds: f64 = trimmed
        .replace(',', ".")
        .parse()
        .with_context(|| format!("Not a number of seconds: {trimmed:?}"))?;

    if !seconds.is_finite() {
        bail!("Not a finite number of seconds: {trimmed:?}");
    }

    Ok(seconds)
}

fn text_field(raw: &str) -> String {
    if raw == MISSING_VALUE {
        String::new()
    } else {
        raw.to_string()
    }
}

/// Streams and some cloud tracks report no duration.
fn optional_seconds(raw: &str) -> Result<f64> {
    if raw.trim() == MISSING_VALUE {
        Ok(0.0)
    } else {
        parse_seconds(raw)
    }
}
