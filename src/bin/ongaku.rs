//! Ongaku - Discord Rich Presence for Apple Music
//!
//! Runs as a menu bar application without a visible window.
//!
//! Architecture:
//! - Main thread: runs the winit event loop, which also pumps the run loop
//!   that delivers tray menu clicks and the player's `playerInfo` notification
//! - Watcher thread: queries the player and updates Discord, one event at a time

fn main() {
    #[cfg(target_os = "macos")]
    app::run();

    #[cfg(not(target_os = "macos"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
        log::error!("Ongaku only runs on macOS. Use ongaku-debug to inspect the player bridge.");
        std::process::exit(1);
    }
}

#[cfg(target_os = "macos")]
mod app {
    use log::{error, info, warn};
    use ongaku::notifications::PlayerInfoObserver;
    use ongaku::tray::{TrayController, TrayEvent};
    use ongaku::{
        DiscordPresenceClient, IntegrationTarget, OsaScriptBridge, StatusWatcher, WatcherHandle,
    };
    use tray_icon::menu::MenuEvent;
    use winit::application::ApplicationHandler;
    use winit::event::WindowEvent;
    use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
    use winit::platform::macos::{ActivationPolicy, EventLoopBuilderExtMacOS};
    use winit::window::WindowId;

    /// Events sent to the main thread
    #[derive(Debug, Clone)]
    enum UserEvent {
        /// Status line from the watcher thread
        StatusUpdate(String),
        /// Menu event from tray
        MenuEvent(MenuEvent),
    }

    /// Application state
    struct App {
        tray: TrayController,
        watcher: Option<WatcherHandle>,
        _observer: Option<PlayerInfoObserver>,
    }

    impl App {
        /// Stop the watcher (which clears the presence) and leave the event loop.
        fn on_quit_selected(&mut self, event_loop: &ActiveEventLoop) {
            info!("Quit requested, shutting down...");
            if let Some(watcher) = self.watcher.take() {
                watcher.shutdown();
            }
            event_loop.exit();
        }
    }

    impl ApplicationHandler<UserEvent> for App {
        fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
            // Not used for tray-only app
        }

        fn window_event(
            &mut self,
            _event_loop: &ActiveEventLoop,
            _id: WindowId,
            _event: WindowEvent,
        ) {
            // No windows in tray-only app
        }

        fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
            match event {
                UserEvent::StatusUpdate(status) => self.tray.update_status(&status),
                UserEvent::MenuEvent(menu_event) => {
                    if TrayEvent::from_menu_id(&menu_event.id.0) == Some(TrayEvent::Quit) {
                        self.on_quit_selected(event_loop);
                    }
                }
            }
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();

        info!("🎵 Ongaku starting...");

        let target = IntegrationTarget::select();
        info!(
            "Watching {} ({})",
            target.display_name, target.application_identifier
        );

        // Accessory: no Dock icon even when run outside the .app bundle
        let event_loop = match EventLoop::<UserEvent>::with_user_event()
            .with_activation_policy(ActivationPolicy::Accessory)
            .build()
        {
            Ok(event_loop) => event_loop,
            Err(e) => {
                error!("Failed to create event loop: {e}");
                return;
            }
        };

        // Set control flow to wait (efficient, no busy loop)
        event_loop.set_control_flow(ControlFlow::Wait);

        let menu_proxy = event_loop.create_proxy();
        MenuEvent::set_event_handler(Some(move |event| {
            let _ = menu_proxy.send_event(UserEvent::MenuEvent(event));
        }));

        let tray = match TrayController::new() {
            Ok(tray) => tray,
            Err(e) => {
                error!("{e:#}");
                return;
            }
        };
        info!("✅ System tray initialized");

        let status_proxy = event_loop.create_proxy();
        let watcher = StatusWatcher::new(
            target,
            OsaScriptBridge::new(target),
            DiscordPresenceClient::new(target),
        )
        .with_status_sink(move |status| {
            let _ = status_proxy.send_event(UserEvent::StatusUpdate(status.to_string()));
        })
        .start();

        let observer = match PlayerInfoObserver::register(target, watcher.sender()) {
            Ok(observer) => Some(observer),
            Err(e) => {
                warn!("{e:#}");
                None
            }
        };

        let mut app = App {
            tray,
            watcher: Some(watcher),
            _observer: observer,
        };

        info!("🔄 Running event loop...");
        if let Err(e) = event_loop.run_app(&mut app) {
            error!("Event loop error: {e}");
        }
    }
}
