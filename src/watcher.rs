//! Status watcher
//!
//! Owns the presence connection and turns player notifications into
//! presence updates. All work happens on one worker thread that drains a
//! channel of [`WatcherEvent`]s, so an update always finishes (query,
//! build, submit) before the next one starts.

use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use crate::bridge::PlayerBridge;
use crate::client::PresenceClient;
use crate::presence::{build_payload, PresencePayload};
use crate::target::IntegrationTarget;
use crate::{util, PlaybackState};

/// Longest status line shown in the tray menu
const STATUS_MAX_CHARS: usize = 40;

/// Events delivered to the watcher's worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherEvent {
    /// The player posted `playerInfo`
    PlayerInfoChanged,
    /// User clicked Quit
    Shutdown,
}

/// Receives human-readable status lines (shown in the tray menu)
pub type StatusSink = Box<dyn Fn(&str) + Send>;

/// Connects to the presence client and keeps it in sync with the player
pub struct StatusWatcher<B, C> {
    target: &'static IntegrationTarget,
    bridge: B,
    client: C,
    status: StatusSink,
    connected: bool,
}

impl<B: PlayerBridge, C: PresenceClient> StatusWatcher<B, C> {
    pub fn new(target: &'static IntegrationTarget, bridge: B, client: C) -> Self {
        Self {
            target,
            bridge,
            client,
            status: Box::new(|_| {}),
            connected: false,
        }
    }

    /// Report status lines to `sink` instead of dropping them
    #[must_use]
    pub fn with_status_sink(mut self, sink: impl Fn(&str) + Send + 'static) -> Self {
        self.status = Box::new(sink);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Connect to the presence client. On success the loading placeholder is
    /// shown, followed immediately by the real state.
    pub fn connect(&mut self) -> bool {
        info!("🔗 Connecting to Discord...");
        match self.client.connect() {
            Ok(()) => {
                info!("✅ Connected to Discord!");
                self.connected = true;
                self.on_connect();
            }
            Err(e) => {
                error!("{e:#}");
                (self.status)("Discord not available");
            }
        }
        self.connected
    }

    fn on_connect(&mut self) {
        self.submit(&PresencePayload::loading(self.target));
        self.update_presence();
    }

    /// Query the player and push the result.
    pub fn update_presence(&mut self) {
        self.update_presence_at(SystemTime::now());
    }

    /// [`Self::update_presence`] with an explicit clock.
    pub fn update_presence_at(&mut self, now: SystemTime) {
        if !self.connected {
            debug!("Not connected to Discord, skipping update");
            return;
        }

        let payload = self.compute_payload(now);
        self.submit(&payload);
        (self.status)(&util::truncate(&payload.summary(), STATUS_MAX_CHARS));
    }

    /// Build the payload for the player's current state.
    ///
    /// Bridge failures never escape: an unreachable player reads as idle, a
    /// missing state as unknown and a missing position falls back to the one
    /// sampled with the track.
    pub fn compute_payload(&self, now: SystemTime) -> PresencePayload {
        let track = match self.bridge.current_track() {
            Ok(track) => track,
            Err(e) => {
                warn!("Couldn't read {}: {e:#}", self.target.display_name);
                None
            }
        };

        let Some(track) = track else {
            return PresencePayload::idle();
        };

        let state = self.bridge.player_state().unwrap_or_else(|e| {
            debug!("Couldn't read player state: {e:#}");
            None
        });

        let position = if state == Some(PlaybackState::Playing) {
            self.bridge.player_position().unwrap_or_else(|e| {
                debug!("Couldn't read player position: {e:#}");
                track.position_seconds
            })
        } else {
            track.position_seconds
        };

        build_payload(self.target, Some(&track), state, position, now)
    }

    fn submit(&mut self, payload: &PresencePayload) {
        match self.client.set_presence(payload) {
            Ok(()) => debug!("Updated presence: {}", payload.summary()),
            Err(e) => warn!("Discord update error: {e:#}"),
        }
    }

    /// Connect, then handle events until shutdown or until every sender is gone.
    pub fn run(&mut self, events: &Receiver<WatcherEvent>) {
        self.connect();

        while let Ok(event) = events.recv() {
            match event {
                WatcherEvent::PlayerInfoChanged => self.update_presence(),
                WatcherEvent::Shutdown => {
                    info!("Watcher shutting down...");
                    break;
                }
            }
        }

        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.connected {
            return;
        }
        if let Err(e) = self.client.clear() {
            debug!("{e:#}");
        }
        if let Err(e) = self.client.close() {
            debug!("{e:#}");
        }
        self.connected = false;
    }
}

impl<B, C> StatusWatcher<B, C>
where
    B: PlayerBridge + Send + 'static,
    C: PresenceClient + Send + 'static,
{
    /// Run the watcher on its own thread. Connecting happens there too, so
    /// this returns immediately.
    pub fn start(mut self) -> WatcherHandle {
        let (sender, receiver) = mpsc::channel();
        let thread = thread::spawn(move || self.run(&receiver));
        WatcherHandle { sender, thread }
    }
}

/// Handle to a watcher running on its own thread
pub struct WatcherHandle {
    sender: Sender<WatcherEvent>,
    thread: JoinHandle<()>,
}

impl WatcherHandle {
    /// A sender for notification observers
    pub fn sender(&self) -> Sender<WatcherEvent> {
        self.sender.clone()
    }

    pub fn notify_player_info_changed(&self) {
        let _ = self.sender.send(WatcherEvent::PlayerInfoChanged);
    }

    /// Stop the watcher and wait for it to clear the presence.
    pub fn shutdown(self) {
        let _ = self.sender.send(WatcherEvent::Shutdown);
        if self.thread.join().is_err() {
            error!("Watcher thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::{
        IDLE_DETAILS, LOADING_DETAILS, PAUSED_DETAILS, UNKNOWN_DETAILS,
    };
    use crate::target::MUSIC;
    use crate::TrackInfo;
    use anyhow::{anyhow, bail, Result};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, UNIX_EPOCH};

    #[derive(Default)]
    struct MockBridge {
        track: Option<TrackInfo>,
        state: Option<PlaybackState>,
        position: Option<f64>,
        track_fails: bool,
        state_fails: bool,
    }

    impl PlayerBridge for MockBridge {
        fn current_track(&self) -> Result<Option<TrackInfo>> {
            if self.track_fails {
                bail!("Not allowed to control Music");
            }
            Ok(self.track.clone())
        }

        fn player_state(&self) -> Result<Option<PlaybackState>> {
            if self.state_fails {
                bail!("AppleScript failed");
            }
            Ok(self.state)
        }

        fn player_position(&self) -> Result<f64> {
            self.position.ok_or_else(|| anyhow!("no position"))
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Set(PresencePayload),
        Clear,
        Close,
    }

    #[derive(Clone, Default)]
    struct MockClient {
        calls: Arc<Mutex<Vec<Call>>>,
        refuse_connection: bool,
    }

    impl MockClient {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn payloads(&self) -> Vec<PresencePayload> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::Set(payload) => Some(payload),
                    _ => None,
                })
                .collect()
        }
    }

    impl PresenceClient for MockClient {
        fn connect(&mut self) -> Result<()> {
            if self.refuse_connection {
                bail!("Discord not available");
            }
            Ok(())
        }

        fn set_presence(&mut self, payload: &PresencePayload) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Set(payload.clone()));
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Clear);
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Close);
            Ok(())
        }
    }

    fn playing_bridge() -> MockBridge {
        MockBridge {
            track: Some(TrackInfo {
                name: "Nocturne".to_string(),
                album: "Night Music".to_string(),
                artist: "Some Artist".to_string(),
                duration_seconds: 200.4,
                position_seconds: 10.0,
            }),
            state: Some(PlaybackState::Playing),
            position: Some(59.6),
            ..MockBridge::default()
        }
    }

    fn fixed_now() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    #[test]
    fn test_connect_sends_loading_then_state() {
        let client = MockClient::default();
        let mut watcher = StatusWatcher::new(&MUSIC, playing_bridge(), client.clone());

        assert!(watcher.connect());

        let payloads = client.payloads();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].details(), LOADING_DETAILS);
        assert_eq!(payloads[1].details(), "Nocturne");
    }

    #[test]
    fn test_connection_failure_sends_nothing() {
        let client = MockClient {
            refuse_connection: true,
            ..MockClient::default()
        };
        let mut watcher = StatusWatcher::new(&MUSIC, playing_bridge(), client.clone());

        assert!(!watcher.connect());
        watcher.update_presence();

        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_bridge_failure_renders_idle() {
        let bridge = MockBridge {
            track_fails: true,
            ..playing_bridge()
        };
        let watcher = StatusWatcher::new(&MUSIC, bridge, MockClient::default());

        let payload = watcher.compute_payload(fixed_now());
        assert_eq!(payload, PresencePayload::idle());
    }

    #[test]
    fn test_state_failure_renders_unknown() {
        let bridge = MockBridge {
            state_fails: true,
            ..playing_bridge()
        };
        let watcher = StatusWatcher::new(&MUSIC, bridge, MockClient::default());

        assert_eq!(watcher.compute_payload(fixed_now()).details(), UNKNOWN_DETAILS);
    }

    #[test]
    fn test_position_uses_player_position() {
        let watcher = StatusWatcher::new(&MUSIC, playing_bridge(), MockClient::default());
        let payload = watcher.compute_payload(fixed_now());

        // 59.6 rounds to 60
        assert_eq!(payload.start_time(), Some((1_700_000_000 - 60) * 1000));
        assert_eq!(payload.end_time(), Some((1_700_000_000 + 140) * 1000));
    }

    #[test]
    fn test_position_failure_falls_back_to_track_sample() {
        let bridge = MockBridge {
            position: None,
            ..playing_bridge()
        };
        let watcher = StatusWatcher::new(&MUSIC, bridge, MockClient::default());
        let payload = watcher.compute_payload(fixed_now());

        assert_eq!(payload.start_time(), Some((1_700_000_000 - 10) * 1000));
    }

    #[test]
    fn test_extreme_track_times_keep_worker_alive() {
        let mut bridge = playing_bridge();
        if let Some(track) = bridge.track.as_mut() {
            track.duration_seconds = 1e300;
        }
        let client = MockClient::default();
        let handle = StatusWatcher::new(&MUSIC, bridge, client.clone()).start();

        handle.notify_player_info_changed();
        handle.notify_player_info_changed();
        handle.shutdown();

        // loading + initial + two notifications, then clear and close
        let calls = client.calls();
        assert_eq!(calls.len(), 6);
        for call in &calls[1..4] {
            assert!(matches!(call, Call::Set(p) if p.details() == "Nocturne" && p.timestamps().is_none()));
        }
        assert_eq!(calls[5], Call::Close);
    }

    #[test]
    fn test_paused_ignores_track_contents() {
        let bridge = MockBridge {
            state: Some(PlaybackState::Paused),
            ..playing_bridge()
        };
        let watcher = StatusWatcher::new(&MUSIC, bridge, MockClient::default());
        let payload = watcher.compute_payload(fixed_now());

        assert_eq!(payload.details(), PAUSED_DETAILS);
        assert_eq!(payload.large_image(), None);
        assert_eq!(payload.timestamps(), None);
    }

    #[test]
    fn test_repeated_updates_are_identical() {
        let client = MockClient::default();
        let mut watcher = StatusWatcher::new(&MUSIC, playing_bridge(), client.clone());
        assert!(watcher.connect());

        watcher.update_presence_at(fixed_now());
        watcher.update_presence_at(fixed_now());

        let payloads = client.payloads();
        let last_two = &payloads[payloads.len() - 2..];
        assert_eq!(last_two[0], last_two[1]);
    }

    #[test]
    fn test_run_handles_events_until_shutdown() {
        let client = MockClient::default();
        let mut watcher = StatusWatcher::new(&MUSIC, MockBridge::default(), client.clone());

        let (sender, receiver) = mpsc::channel();
        sender.send(WatcherEvent::PlayerInfoChanged).unwrap();
        sender.send(WatcherEvent::PlayerInfoChanged).unwrap();
        sender.send(WatcherEvent::Shutdown).unwrap();
        sender.send(WatcherEvent::PlayerInfoChanged).unwrap();

        watcher.run(&receiver);

        let calls = client.calls();
        // loading + initial + two notifications, then clear and close
        assert_eq!(calls.len(), 6);
        assert!(matches!(&calls[0], Call::Set(p) if p.details() == LOADING_DETAILS));
        for call in &calls[1..4] {
            assert!(matches!(call, Call::Set(p) if p.details() == IDLE_DETAILS));
        }
        assert_eq!(calls[4], Call::Clear);
        assert_eq!(calls[5], Call::Close);
        assert!(!watcher.is_connected());
    }

    #[test]
    fn test_run_without_connection_never_clears() {
        let client = MockClient {
            refuse_connection: true,
            ..MockClient::default()
        };
        let mut watcher = StatusWatcher::new(&MUSIC, playing_bridge(), client.clone());

        let (sender, receiver) = mpsc::channel();
        sender.send(WatcherEvent::PlayerInfoChanged).unwrap();
        drop(sender);

        watcher.run(&receiver);
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_status_sink_receives_summary() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let mut watcher = StatusWatcher::new(&MUSIC, MockBridge::default(), MockClient::default())
            .with_status_sink(move |line| sink_lines.lock().unwrap().push(line.to_string()));

        watcher.connect();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(IDLE_DETAILS));
        assert!(lines[0].chars().count() <= STATUS_MAX_CHARS);
    }

    #[test]
    fn test_start_and_shutdown_on_worker_thread() {
        let client = MockClient::default();
        let handle = StatusWatcher::new(&MUSIC, playing_bridge(), client.clone()).start();

        handle.notify_player_info_changed();
        handle.shutdown();

        let calls = client.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[3], Call::Clear);
        assert_eq!(calls[4], Call::Close);
    }
}
