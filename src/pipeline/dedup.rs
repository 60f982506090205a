use crate::common::Identity;

/// Remembers the most recently announced identity and suppresses repeats.
///
/// Only one identity is remembered: `A, A, B, A` announces `A, B, A`.
#[derive(Debug, Default)]
pub struct IdentityDeduplicator {
    last_announced: Option<String>,
}

impl IdentityDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-then-set in one step: returns `true` and remembers `identity`
    /// when it differs from the last announced one.
    pub fn should_announce(&mut self, identity: &Identity) -> bool {
        if self.last_announced.as_deref() == Some(identity.key()) {
            return false;
        }
        self.last_announced = Some(identity.key().to_string());
        true
    }

    pub fn last_announced(&self) -> Option<&str> {
        self.last_announced.as_deref()
    }
}
