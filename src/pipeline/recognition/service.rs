use crate::common::{Frame, Identity};
use crate::error::RecognitionError;
use crate::pipeline::recognition::Recognizer;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder};

pub type BoxRecognitionService = BoxCloneService<Frame, Option<Identity>, RecognitionError>;

/// Adapts a [`Recognizer`] into a `tower::Service` so it can be layered.
#[derive(Clone)]
pub struct RecognitionService {
    inner: Arc<dyn Recognizer>,
}

impl RecognitionService {
    pub fn new(inner: Arc<dyn Recognizer>) -> Self {
        Self { inner }
    }
}

impl Service<Frame> for RecognitionService {
    type Response = Option<Identity>;
    type Error = RecognitionError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, frame: Frame) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move { inner.recognize(&frame).await })
    }
}

/// Builds the upload stack: recognizer, bounded by `timeout`.
///
/// Each admitted frame gets its own clone of the returned service, so uploads
/// proceed concurrently.
pub fn recognition_stack(
    recognizer: Arc<dyn Recognizer>,
    timeout: Duration,
) -> BoxRecognitionService {
    let service = ServiceBuilder::new()
        .map_err(into_recognition_error as fn(BoxError) -> RecognitionError)
        .timeout(timeout)
        .service(RecognitionService::new(recognizer));
    BoxCloneService::new(service)
}

fn into_recognition_error(error: BoxError) -> RecognitionError {
    if error.is::<tower::timeout::error::Elapsed>() {
        return RecognitionError::Timeout;
    }
    match error.downcast::<RecognitionError>() {
        Ok(error) => *error,
        Err(other) => RecognitionError::Service(other.to_string()),
    }
}
