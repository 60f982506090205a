pub mod directory;
pub mod sink;

pub use directory::DirectoryFrameSource;
pub use sink::FrameSink;
