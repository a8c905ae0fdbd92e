//! System tray implementation
//!
//! The menu bar icon for Ongaku: a disabled status line showing what is on
//! the Discord profile, and Quit. Uses the `tray-icon` crate; the icon has to
//! be created on the main thread, before the event loop starts running.

/// Menu item identifiers
pub const MENU_ID_STATUS: &str = "status";
pub const MENU_ID_QUIT: &str = "quit";

/// Tooltip and initial status line
pub const APP_TITLE: &str = "Ongaku";

/// Events from the tray menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayEvent {
    /// User clicked Quit
    Quit,
}

impl TrayEvent {
    /// Map a clicked menu item to an event. The status line isn't clickable.
    pub fn from_menu_id(id: &str) -> Option<Self> {
        match id {
            MENU_ID_QUIT => Some(Self::Quit),
            _ => None,
        }
    }
}

#[cfg(target_os = "macos")]
pub use controller::TrayController;

#[cfg(target_os = "macos")]
mod controller {
    use super::{APP_TITLE, MENU_ID_QUIT, MENU_ID_STATUS};
    use anyhow::{Context, Result};
    use tray_icon::{
        menu::{Menu, MenuItem, PredefinedMenuItem},
        Icon, TrayIcon, TrayIconBuilder,
    };

    /// Owns the menu bar icon. Dropping it removes the icon.
    pub struct TrayController {
        _tray_icon: TrayIcon,
        status_item: MenuItem,
    }

    impl TrayController {
        /// Create the tray icon and menu
        pub fn new() -> Result<Self> {
            let icon = Self::load_icon()?;

            let status_item = MenuItem::with_id(MENU_ID_STATUS, APP_TITLE, false, None);
            let quit_item = MenuItem::with_id(MENU_ID_QUIT, "Quit", true, None);

            let menu = Menu::new();
            menu.append(&status_item)?;
            menu.append(&PredefinedMenuItem::separator())?;
            menu.append(&quit_item)?;

            let tray_icon = TrayIconBuilder::new()
                .with_icon(icon)
                .with_icon_as_template(true)
                .with_menu(Box::new(menu))
                .with_tooltip(APP_TITLE)
                .build()
                .context("Failed to create tray icon")?;

            Ok(Self {
                _tray_icon: tray_icon,
                status_item,
            })
        }

        fn load_icon() -> Result<Icon> {
            let icon_bytes = include_bytes!("../assets/tray_icon.png");

            let image = image::load_from_memory(icon_bytes)
                .context("Failed to load tray icon image")?
                .into_rgba8();

            let (width, height) = image.dimensions();
            let rgba = image.into_raw();

            Icon::from_rgba(rgba, width, height).context("Failed to create icon from RGBA data")
        }

        /// Update the status text shown in the tray menu
        pub fn update_status(&self, status: &str) {
            self.status_item.set_text(status);
        }
    }
}
