use crate::announce::Announcement;
use tracing::info;

/// Output collaborator for greetings. Fire-and-forget: implementations must
/// return promptly and never report back.
pub trait Announcer: Send + Sync {
    fn announce(&self, announcement: &Announcement);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnnouncer;

impl Announcer for TracingAnnouncer {
    fn announce(&self, announcement: &Announcement) {
        info!(subject = %announcement.subject, "{}", announcement.text);
    }
}

/// Hands each announcement to every inner announcer, in order.
#[derive(Default)]
pub struct FanoutAnnouncer {
    announcers: Vec<Box<dyn Announcer>>,
}

impl FanoutAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, announcer: Box<dyn Announcer>) -> Self {
        self.announcers.push(announcer);
        self
    }

    pub fn len(&self) -> usize {
        self.announcers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcers.is_empty()
    }
}

impl Announcer for FanoutAnnouncer {
    fn announce(&self, announcement: &Announcement) {
        for announcer in &self.announcers {
            announcer.announce(announcement);
        }
    }
}
