pub mod announce;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod intake;
pub mod pipeline;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder, PipelineHandle};
pub use error::{AppError, ClassifierError, RecognitionError};
