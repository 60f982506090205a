use crate::announce::{Announcement, Announcer, GreetingComposer};
use crate::pipeline::dedup::IdentityDeduplicator;
use crate::pipeline::recognition::RecognitionResult;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Consumes recognition results on a single task, so the deduplicator's
/// check-then-set never races between concurrent uploads.
pub struct AnnouncementDispatcher {
    dedup: IdentityDeduplicator,
    composer: GreetingComposer,
    announcer: Box<dyn Announcer>,
}

impl AnnouncementDispatcher {
    pub fn new(composer: GreetingComposer, announcer: Box<dyn Announcer>) -> Self {
        Self {
            dedup: IdentityDeduplicator::new(),
            composer,
            announcer,
        }
    }

    pub fn last_announced(&self) -> Option<&str> {
        self.dedup.last_announced()
    }

    /// Returns the announcement emitted for this result, if any.
    pub fn handle(&mut self, result: RecognitionResult) -> Option<Announcement> {
        let latency = result.received_at.elapsed();
        let identity = match result.outcome {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                debug!(frame_id = %result.frame_id, "No identity in response");
                return None;
            }
            Err(e) => {
                warn!(frame_id = %result.frame_id, "Upload failed, dropping: {}", e);
                return None;
            }
        };

        if !self.dedup.should_announce(&identity) {
            debug!(
                frame_id = %result.frame_id,
                subject = identity.display_name(),
                "Subject already announced"
            );
            return None;
        }

        let announcement = self.composer.compose(&identity);
        info!(
            frame_id = %result.frame_id,
            subject = %announcement.subject,
            queued_us = latency.as_micros() as u64,
            "Announcing subject"
        );
        self.announcer.announce(&announcement);
        Some(announcement)
    }

    pub async fn run(
        mut self,
        mut result_rx: mpsc::Receiver<RecognitionResult>,
        cancel_token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Announcement dispatcher cancelled");
                    break;
                }
                result = result_rx.recv() => match result {
                    Some(result) => {
                        self.handle(result);
                    }
                    None => {
                        debug!("Recognition channel closed");
                        break;
                    }
                },
            }
        }
    }
}
