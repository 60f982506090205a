use std::time::Duration;
use tokio::time::Instant;

/// Cooldown gate: admits at most one timestamp per `interval`.
///
/// Nothing is queued while the gate is closed; the caller drops whatever it
/// was about to do.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last_admitted: Option<Instant>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    /// Returns `true` and records `now` if at least `interval` has passed since
    /// the last admission (or nothing was admitted yet).
    pub fn try_admit(&mut self, now: Instant) -> bool {
        let open = match self.last_admitted {
            None => true,
            // A timestamp older than the last admission never reopens the gate.
            Some(last) => now >= last && now.duration_since(last) >= self.interval,
        };
        if open {
            self.last_admitted = Some(now);
        }
        open
    }
}
