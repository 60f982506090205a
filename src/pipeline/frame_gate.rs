use crate::common::Frame;
use crate::intake::FrameSink;
use crate::pipeline::classifier::FrameClassifier;
use crate::pipeline::rate_gate::RateGate;
use crate::pipeline::recognition::{BoxRecognitionService, RecognitionResult};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Throttled,
    NoSubject,
    Uploading,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    pub received: u64,
    pub throttled: u64,
    pub no_subject: u64,
    pub uploaded: u64,
}

/// Hot-path half of the pipeline: cooldown gate, then classifier, then an
/// upload spawned off the delivery path.
///
/// Results are sent to the announcement dispatcher; nothing here waits on the
/// network.
pub struct FrameGate {
    rate_gate: RateGate,
    classifier: Box<dyn FrameClassifier>,
    recognition: BoxRecognitionService,
    result_tx: mpsc::Sender<RecognitionResult>,
    runtime: Handle,
    stats: GateStats,
}

impl FrameGate {
    /// `runtime` runs the uploads, which lets `process` be called from a
    /// capture thread outside of Tokio.
    pub fn new(
        rate_gate: RateGate,
        classifier: Box<dyn FrameClassifier>,
        recognition: BoxRecognitionService,
        result_tx: mpsc::Sender<RecognitionResult>,
        runtime: Handle,
    ) -> Self {
        Self {
            rate_gate,
            classifier,
            recognition,
            result_tx,
            runtime,
            stats: GateStats::default(),
        }
    }

    pub fn stats(&self) -> GateStats {
        self.stats
    }

    pub fn process(&mut self, frame: Frame) -> GateDecision {
        self.stats.received += 1;

        if !self.rate_gate.try_admit(frame.captured_at()) {
            self.stats.throttled += 1;
            return GateDecision::Throttled;
        }

        match self.classifier.has_subject(&frame) {
            Ok(true) => {}
            Ok(false) => {
                debug!(frame_id = %frame.id(), "No subject in admitted frame");
                self.stats.no_subject += 1;
                return GateDecision::NoSubject;
            }
            Err(e) => {
                debug!(
                    frame_id = %frame.id(),
                    classifier = self.classifier.name(),
                    "Classifier failed, treating as no subject: {}",
                    e
                );
                self.stats.no_subject += 1;
                return GateDecision::NoSubject;
            }
        }

        self.stats.uploaded += 1;
        self.spawn_upload(frame);
        GateDecision::Uploading
    }

    fn spawn_upload(&self, frame: Frame) {
        let recognition = self.recognition.clone();
        let result_tx = self.result_tx.clone();
        let frame_id = frame.id();
        debug!(%frame_id, captured = %frame.captured_wall(), "Dispatching upload");

        self.runtime.spawn(async move {
            let outcome = recognition.oneshot(frame).await;
            if result_tx
                .send(RecognitionResult::new(frame_id, outcome))
                .await
                .is_err()
            {
                debug!(%frame_id, "Dispatcher stopped, dropping recognition result");
            }
        });
    }
}

impl FrameSink for FrameGate {
    fn push(&mut self, frame: Frame) {
        self.process(frame);
    }
}
