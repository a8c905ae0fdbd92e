//! Player change notifications
//!
//! Music and iTunes post `<bundle id>.playerInfo` to the distributed
//! notification center on every play, pause, stop and track change. The
//! observer forwards each one to the watcher as
//! [`WatcherEvent::PlayerInfoChanged`]. Delivery needs a running main run
//! loop, which the tray binary's event loop provides.

use anyhow::Result;
use std::sync::mpsc::Sender;

use crate::target::IntegrationTarget;
use crate::watcher::WatcherEvent;

/// Token for the registered `playerInfo` observer.
///
/// Dropping it does not unregister the block: the notification center keeps
/// the observer until the process exits. Register once per process.
pub struct PlayerInfoObserver {
    #[cfg(target_os = "macos")]
    _token: objc2::rc::Retained<objc2::runtime::ProtocolObject<dyn objc2::runtime::NSObjectProtocol>>,
}

#[cfg(target_os = "macos")]
impl PlayerInfoObserver {
    /// Subscribe to the target's `playerInfo` notification.
    #[allow(clippy::unnecessary_wraps)]
    pub fn register(target: &IntegrationTarget, sender: Sender<WatcherEvent>) -> Result<Self> {
        use block2::RcBlock;
        use log::{debug, info};
        use objc2_foundation::{NSDistributedNotificationCenter, NSNotification, NSString};
        use std::ptr::NonNull;

        let notification_name = target.notification_name();
        let name = NSString::from_str(&notification_name);

        let block = RcBlock::new(move |_notification: NonNull<NSNotification>| {
            if sender.send(WatcherEvent::PlayerInfoChanged).is_err() {
                debug!("Watcher gone, dropping playerInfo notification");
            }
        });

        let center = NSDistributedNotificationCenter::defaultCenter();
        // No queue: the block runs on the posting run loop's thread and only
        // touches the channel.
        let token = unsafe {
            center.addObserverForName_object_queue_usingBlock(Some(&*name), None, None, &block)
        };

        info!("👂 Observing {notification_name}");
        Ok(Self { _token: token })
    }
}

#[cfg(not(target_os = "macos"))]
impl PlayerInfoObserver {
    /// Distributed notifications only exist on macOS.
    pub fn register(target: &IntegrationTarget, _sender: Sender<WatcherEvent>) -> Result<Self> {
        anyhow::bail!(
            "Can't observe {}: distributed notifications are only available on macOS",
            target.notification_name()
        )
    }
}
