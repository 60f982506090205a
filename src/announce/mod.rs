pub mod announcement;
pub mod announcer;
pub mod display;
pub mod speech;

pub use announcement::{Announcement, GreetingComposer};
pub use announcer::{Announcer, FanoutAnnouncer, TracingAnnouncer};
pub use display::{DisplayAnnouncer, DisplayUpdate};
pub use speech::SpeechCommandAnnouncer;
