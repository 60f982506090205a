use crate::{
    announce::{Announcer, GreetingComposer, TracingAnnouncer},
    common::Frame,
    config::Configuration,
    error::AppError,
    intake::FrameSink,
    pipeline::{
        classifier::{self, FrameClassifier},
        dispatcher::AnnouncementDispatcher,
        frame_gate::FrameGate,
        rate_gate::RateGate,
        recognition::{RecognitionResult, Recognizer, recognition_stack},
    },
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Cloneable entry point for capture sources. Never blocks: when the frame
/// loop is still busy with the previous frame, the new one is dropped.
#[derive(Clone)]
pub struct PipelineHandle {
    frame_tx: mpsc::Sender<Frame>,
}

impl PipelineHandle {
    /// Returns `false` if the frame was dropped.
    pub fn submit(&self, frame: Frame) -> bool {
        match self.frame_tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                debug!(frame_id = %frame.id(), "Pipeline busy, dropping late frame");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.frame_tx.is_closed()
    }
}

impl FrameSink for PipelineHandle {
    fn push(&mut self, frame: Frame) {
        self.submit(frame);
    }
}

pub struct Coordinator {
    frame_task: Option<tokio::task::JoinHandle<()>>,
    dispatch_task: Option<tokio::task::JoinHandle<()>>,
    cancel_token: CancellationToken,
    handle: PipelineHandle,
}

impl Coordinator {
    fn new(
        configuration: Configuration,
        gate: FrameGate,
        frame_rx: Receiver<Frame>,
        handle: PipelineHandle,
        dispatcher: AnnouncementDispatcher,
        result_rx: Receiver<RecognitionResult>,
        runtime: &Handle,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        info!(
            cooldown = ?configuration.upload.cooldown(),
            endpoint = %configuration.upload.endpoint,
            "Starting pipeline"
        );

        Self {
            frame_task: Some(Self::start_frame_task(
                runtime,
                gate,
                frame_rx,
                cancel_token.clone(),
            )),
            dispatch_task: Some(runtime.spawn(dispatcher.run(result_rx, cancel_token.clone()))),
            cancel_token,
            handle,
        }
    }

    fn start_frame_task(
        runtime: &Handle,
        mut gate: FrameGate,
        mut frame_rx: Receiver<Frame>,
        cancel_token: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    frame = frame_rx.recv() => match frame {
                        Some(frame) => {
                            gate.process(frame);
                        }
                        None => break,
                    },
                }
            }
            let stats = gate.stats();
            info!(
                received = stats.received,
                throttled = stats.throttled,
                no_subject = stats.no_subject,
                uploaded = stats.uploaded,
                "Frame loop stopped"
            );
        })
    }

    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Stops both loops and waits for them to finish. In-flight uploads are
    /// not cancelled; their results are dropped.
    pub async fn shutdown(mut self) -> Result<(), AppError> {
        self.stop();
        if let Some(frame_task) = self.frame_task.take() {
            frame_task
                .await
                .map_err(|e| AppError::Pipeline(format!("Frame loop failed: {e}")))?;
        }
        if let Some(dispatch_task) = self.dispatch_task.take() {
            dispatch_task
                .await
                .map_err(|e| AppError::Pipeline(format!("Dispatcher failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    classifier: Option<Box<dyn FrameClassifier>>,
    recognizer: Option<Arc<dyn Recognizer>>,
    announcer: Option<Box<dyn Announcer>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            classifier: None,
            recognizer: None,
            announcer: None,
        }
    }

    // Sets the upload cooldown, this will override the configuration.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.configuration.upload.cooldown_secs = cooldown.as_secs_f64();
        self
    }

    // Adjusts the frame buffer size, this will override the configuration.
    pub fn frame_buffer_size(mut self, frame_buffer_size: usize) -> Self {
        self.configuration.frame_buffer_size = frame_buffer_size;
        self
    }

    // Defaults to the classifier named in the configuration.
    pub fn classifier(mut self, classifier: Box<dyn FrameClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    // Defaults to logging announcements.
    pub fn announcer(mut self, announcer: Box<dyn Announcer>) -> Self {
        self.announcer = Some(announcer);
        self
    }

    /// Spawns the pipeline on the current Tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        self.configuration.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| AppError::Pipeline(format!("Coordinator needs a Tokio runtime: {e}")))?;
        let recognizer = self
            .recognizer
            .ok_or(AppError::Pipeline("Recognizer not set".to_string()))?;
        let classifier = self
            .classifier
            .unwrap_or_else(|| classifier::from_settings(&self.configuration.classifier));
        let announcer = self
            .announcer
            .unwrap_or_else(|| Box::new(TracingAnnouncer));

        let (frame_tx, frame_rx) = mpsc::channel(self.configuration.frame_buffer_size);
        let (result_tx, result_rx) = mpsc::channel(self.configuration.result_buffer_size);

        let gate = FrameGate::new(
            RateGate::new(self.configuration.upload.cooldown()),
            classifier,
            recognition_stack(recognizer, self.configuration.upload.timeout()),
            result_tx,
            runtime.clone(),
        );
        let dispatcher = AnnouncementDispatcher::new(
            GreetingComposer::new(self.configuration.announce.templates.clone()),
            announcer,
        );

        Ok(Coordinator::new(
            self.configuration,
            gate,
            frame_rx,
            PipelineHandle { frame_tx },
            dispatcher,
            result_rx,
            &runtime,
        ))
    }
}
