//! Presence client
//!
//! The watcher talks to Discord only through [`PresenceClient`], which keeps
//! the IPC transport out of the update logic and lets tests record what would
//! have been sent.

use anyhow::{anyhow, Result};
use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use log::debug;
use std::thread;
use std::time::Duration;

use crate::presence::PresencePayload;
use crate::target::IntegrationTarget;

/// Discord Application ID
pub const DISCORD_APP_ID: &str = "402370117901484042";

/// Connection attempts made on startup before giving up
const CONNECT_ATTEMPTS: u32 = 3;

/// Delay between connection attempts
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Something that can display a [`PresencePayload`]
pub trait PresenceClient {
    /// Open the connection.
    fn connect(&mut self) -> Result<()>;

    /// Replace whatever is currently displayed.
    fn set_presence(&mut self, payload: &PresencePayload) -> Result<()>;

    /// Remove the displayed presence.
    fn clear(&mut self) -> Result<()>;

    /// Close the connection.
    fn close(&mut self) -> Result<()>;
}

/// [`PresenceClient`] backed by the local Discord IPC socket
pub struct DiscordPresenceClient {
    client: DiscordIpcClient,
    target: &'static IntegrationTarget,
}

impl DiscordPresenceClient {
    pub fn new(target: &'static IntegrationTarget) -> Self {
        Self {
            client: DiscordIpcClient::new(DISCORD_APP_ID),
            target,
        }
    }
}

impl PresenceClient for DiscordPresenceClient {
    fn connect(&mut self) -> Result<()> {
        let mut last_error = None;

        for attempt in 1..=CONNECT_ATTEMPTS {
            match self.client.connect() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Discord connect attempt {attempt}/{CONNECT_ATTEMPTS} failed: {e}");
                    last_error = Some(e.to_string());
                }
            }
            if attempt < CONNECT_ATTEMPTS {
                thread::sleep(CONNECT_RETRY_DELAY);
            }
        }

        Err(anyhow!(
            "Discord not available: {}",
            last_error.unwrap_or_default()
        ))
    }

    fn set_presence(&mut self, payload: &PresencePayload) -> Result<()> {
        let mut activity_payload = activity::Activity::new()
            .activity_type(activity::ActivityType::Listening)
            .details(payload.details())
            .state(payload.state());

        if let Some(image) = payload.large_image() {
            let assets = activity::Assets::new()
                .large_image(image)
                .large_text(self.target.display_name);
            activity_payload = activity_payload.assets(assets);
        }

        if let Some(timestamps) = payload.timestamps() {
            let timestamps = activity::Timestamps::new()
                .start(timestamps.start)
                .end(timestamps.end);
            activity_payload = activity_payload.timestamps(timestamps);
        }

        self.client
            .set_activity(activity_payload)
            .map_err(|e| anyhow!("Failed to set Discord activity: {e}"))
    }

    fn clear(&mut self) -> Result<()> {
        self.client
            .clear_activity()
            .map_err(|e| anyhow!("Failed to clear Discord activity: {e}"))
    }

    fn close(&mut self) -> Result<()> {
        self.client
            .close()
            .map_err(|e| anyhow!("Failed to close Discord connection: {e}"))
    }
}
