pub mod debouncer;
pub mod frame;
pub mod identity;

pub use debouncer::Debouncer;
pub use frame::Frame;
pub use identity::Identity;
