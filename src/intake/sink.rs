use crate::common::Frame;

/// Push-based frame delivery from a capture source into the pipeline.
///
/// `push` is called at device frame rate and must never block; a sink that
/// cannot take the frame right now drops it.
pub trait FrameSink: Send {
    fn push(&mut self, frame: Frame);
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn push(&mut self, frame: Frame) {
        (**self).push(frame)
    }
}
