use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use crate::hw::AnalogIn;

/// Simulated analog input. Clones share the same value.
#[derive(Debug, Clone)]
pub struct SimAnalog {
    value: Arc<AtomicU16>,
}

impl SimAnalog {
    pub fn new(value: u16) -> SimAnalog {
        SimAnalog {
            value: Arc::new(AtomicU16::new(value)),
        }
    }

    pub fn set(&self, value: u16) {
        self.value.store(value, Ordering::SeqCst)
    }
}

impl AnalogIn for SimAnalog {
    fn value(&mut self) -> u16 {
        self.value.load(Ordering::SeqCst)
    }
}
