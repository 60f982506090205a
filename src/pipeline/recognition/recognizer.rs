use crate::common::{Frame, Identity};
use crate::error::RecognitionError;
use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

/// Remote identification of a frame's subject.
///
/// `Ok(None)` means the service answered but named nobody; only transport
/// level problems are errors.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, frame: &Frame) -> Result<Option<Identity>, RecognitionError>;

    fn name(&self) -> &'static str;
}

/// Outcome of one upload, handed to the announcement dispatcher exactly once.
#[derive(Debug)]
pub struct RecognitionResult {
    pub frame_id: Uuid,
    pub received_at: Instant,
    pub outcome: Result<Option<Identity>, RecognitionError>,
}

impl RecognitionResult {
    pub fn new(frame_id: Uuid, outcome: Result<Option<Identity>, RecognitionError>) -> Self {
        Self {
            frame_id,
            received_at: Instant::now(),
            outcome,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.outcome.as_ref().ok().and_then(Option::as_ref)
    }
}
