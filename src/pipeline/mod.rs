pub mod classifier;
pub mod dedup;
pub mod dispatcher;
pub mod frame_gate;
pub mod rate_gate;
pub mod recognition;

pub use classifier::{AcceptAllClassifier, FrameClassifier, MotionClassifier};
pub use dedup::IdentityDeduplicator;
pub use dispatcher::AnnouncementDispatcher;
pub use frame_gate::{FrameGate, GateDecision, GateStats};
pub use rate_gate::RateGate;
