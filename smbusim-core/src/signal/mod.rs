//! Level-change notification for simulated signal lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Determines a `Trigger`'s behavior.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    /// Triggered when the signal goes high.
    Hi,
    /// Triggered when the signal goes low.
    Lo,
    /// Triggered when the signal changes.
    Edge,
}

/// A way to hook into (one or more) signals and get notified of any changes.
#[derive(Debug, Clone)]
pub struct Trigger {
    kind: TriggerKind,
    trigger: Arc<AtomicBool>,
}

impl Trigger {
    /// Create a new `Trigger`.
    pub fn new(kind: TriggerKind) -> Trigger {
        Trigger {
            kind,
            trigger: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn update(&self, old_val: bool, new_val: bool) {
        use TriggerKind::*;
        let fire = match self.kind {
            Hi => !old_val && new_val,
            Lo => old_val && !new_val,
            Edge => old_val != new_val,
        };
        if fire {
            self.trigger.store(true, Ordering::SeqCst)
        }
    }

    /// Checks if the trigger has fired, without clearing it.
    pub fn check(&self) -> bool {
        self.trigger.load(Ordering::SeqCst)
    }

    /// Retrieves and un-sets the trigger.
    pub fn check_and_clear(&self) -> bool {
        self.trigger.fetch_and(false, Ordering::SeqCst)
    }
}
