use crate::error::AppError;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

enum DebounceCommand {
    Trigger(Instant),
    Cancel,
}

/// Coalesces bursts of `trigger()` calls into a single deferred callback.
///
/// The callback runs `delay` after the last trigger of a burst, on the
/// debouncer's own task, so it never overlaps with itself. At most one
/// deadline is pending at any time. Dropping or disposing the debouncer
/// discards the pending deadline; the callback is never invoked afterwards.
///
/// The timer task runs on the Tokio runtime current at construction.
pub struct Debouncer {
    command_tx: Option<mpsc::UnboundedSender<DebounceCommand>>,
    timer_task: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Fails when called outside a Tokio runtime.
    pub fn new<F>(delay: Duration, callback: F) -> Result<Self, AppError>
    where
        F: FnMut() + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::Pipeline(format!("Debouncer needs a Tokio runtime: {e}")))?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let timer_task = runtime.spawn(run_timer(delay, command_rx, callback));
        Ok(Self {
            command_tx: Some(command_tx),
            timer_task: Some(timer_task),
        })
    }

    /// Replaces any pending deadline with `now + delay`.
    pub fn trigger(&self) {
        self.send(DebounceCommand::Trigger(Instant::now()));
    }

    /// Drops the pending deadline without firing.
    pub fn cancel(&self) {
        self.send(DebounceCommand::Cancel);
    }

    /// Stops the timer task. Later calls to `trigger`/`cancel` are no-ops.
    pub fn dispose(&mut self) {
        self.command_tx = None;
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.command_tx.is_none()
    }

    fn send(&self, command: DebounceCommand) {
        if let Some(command_tx) = &self.command_tx {
            // The timer task only exits once we drop the sender.
            let _ = command_tx.send(command);
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run_timer<F>(
    delay: Duration,
    mut command_rx: mpsc::UnboundedReceiver<DebounceCommand>,
    mut callback: F,
) where
    F: FnMut() + Send + 'static,
{
    let mut deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            biased;
            command = command_rx.recv() => match command {
                Some(DebounceCommand::Trigger(at)) => deadline = Some(at + delay),
                Some(DebounceCommand::Cancel) => deadline = None,
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if deadline.is_some() =>
            {
                deadline = None;
                trace!("debounce window elapsed, firing callback");
                callback();
            }
        }
    }
}
