use crate::announce::{Announcement, Announcer};
use crate::common::Debouncer;
use crate::error::AppError;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    Show(Announcement),
    Clear,
}

/// Publishes greetings for an on-screen label and clears the label once no
/// greeting arrived for `clear_after`.
pub struct DisplayAnnouncer {
    display_tx: broadcast::Sender<DisplayUpdate>,
    clear: Debouncer,
}

impl DisplayAnnouncer {
    /// Fails outside a Tokio runtime, which the clear timer needs.
    pub fn new(
        capacity: usize,
        clear_after: Duration,
    ) -> Result<(Self, broadcast::Receiver<DisplayUpdate>), AppError> {
        let (display_tx, display_rx) = broadcast::channel(capacity.max(1));
        let clear_tx = display_tx.clone();
        let clear = Debouncer::new(clear_after, move || {
            debug!("Clearing display");
            // No subscribers is fine.
            let _ = clear_tx.send(DisplayUpdate::Clear);
        })?;
        Ok((Self { display_tx, clear }, display_rx))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayUpdate> {
        self.display_tx.subscribe()
    }
}

impl Announcer for DisplayAnnouncer {
    fn announce(&self, announcement: &Announcement) {
        let _ = self
            .display_tx
            .send(DisplayUpdate::Show(announcement.clone()));
        self.clear.trigger();
    }
}
