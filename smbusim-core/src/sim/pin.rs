use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::hw::{DigitalIo, DriveMode, PinProvider, Pull, PulseIn};
use crate::signal::{Trigger, TriggerKind};

/// How the device side has configured the pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Input(Option<Pull>),
    Output { value: bool, drive_mode: DriveMode },
}

#[derive(Debug)]
struct Capture {
    queue: VecDeque<u16>,
    maxlen: usize,
    /// Time of the last edge, once capture has seen one.
    last_edge: Option<u64>,
}

#[derive(Debug)]
struct Wire {
    /// Level the host drives onto the wire, if any.
    external: Option<bool>,
    direction: Direction,
    level: bool,

    handles: usize,
    capture: Option<Capture>,
    triggers: Vec<Trigger>,
    now_us: u64,
}

impl Wire {
    fn resolve_level(&self) -> bool {
        match self.direction {
            Direction::Output {
                value,
                drive_mode: DriveMode::PushPull,
            } => {
                if let Some(external) = self.external {
                    if external != value {
                        warn!(target: "PIN", "bus contention: host drives {}, device drives {}", external, value);
                    }
                }
                value
            }
            Direction::Output {
                value: false,
                drive_mode: DriveMode::OpenDrain,
            } => false,
            // open-drain high is pulled up
            Direction::Output {
                value: true,
                drive_mode: DriveMode::OpenDrain,
            } => self.external.unwrap_or(true),
            Direction::Input(pull) => match self.external {
                Some(level) => level,
                None => pull == Some(Pull::Up),
            },
        }
    }

    /// Recompute the level, recording an edge if it changed.
    fn update(&mut self) {
        let old = self.level;
        let new = self.resolve_level();
        if old == new {
            return;
        }
        self.level = new;

        for trigger in self.triggers.iter() {
            trigger.update(old, new);
        }

        if let Some(ref mut capture) = self.capture {
            if let Some(last_edge) = capture.last_edge {
                let width = (self.now_us - last_edge).min(u16::MAX as u64) as u16;
                if capture.queue.len() >= capture.maxlen {
                    capture.queue.pop_front();
                }
                capture.queue.push_back(width);
            }
            capture.last_edge = Some(self.now_us);
        }
    }

    fn claim(&mut self) {
        self.handles += 1;
        if self.handles > 1 {
            warn!(target: "PIN", "pin claimed {} times", self.handles);
        }
        self.direction = Direction::Input(None);
        self.update();
    }

    fn release(&mut self) {
        self.handles = self.handles.saturating_sub(1);
        self.direction = Direction::Input(None);
        self.update();
    }
}

/// A simulated wire between a device pin and the host.
///
/// Clones refer to the same wire. The host side drives and observes the wire
/// through the inherent methods, while the device side claims it through
/// [`PinProvider`].
#[derive(Debug, Clone)]
pub struct SimPin {
    wire: Arc<Mutex<Wire>>,
}

impl Default for SimPin {
    fn default() -> SimPin {
        SimPin::new()
    }
}

impl SimPin {
    /// Create an undriven wire, with no pull resistor. Reads low.
    pub fn new() -> SimPin {
        SimPin {
            wire: Arc::new(Mutex::new(Wire {
                external: None,
                direction: Direction::Input(None),
                level: false,
                handles: 0,
                capture: None,
                triggers: Vec::new(),
                now_us: 0,
            })),
        }
    }

    fn wire(&self) -> MutexGuard<'_, Wire> {
        // the wire state stays consistent even if a holder panicked
        self.wire.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drive the wire from the host side.
    pub fn drive(&self, level: bool) {
        let mut wire = self.wire();
        wire.external = Some(level);
        wire.update();
    }

    /// Stop driving the wire from the host side.
    pub fn release(&self) {
        let mut wire = self.wire();
        wire.external = None;
        wire.update();
    }

    /// Let time pass. Only affects captured pulse widths.
    pub fn advance(&self, us: u64) {
        self.wire().now_us += us;
    }

    /// Current level on the wire.
    pub fn level(&self) -> bool {
        self.wire().level
    }

    /// Push pulses straight into the device's capture queue, without
    /// touching the wire level. Does nothing if the pin isn't capturing.
    pub fn inject_pulses(&self, widths: &[u16]) {
        let mut wire = self.wire();
        if let Some(ref mut capture) = wire.capture {
            for &width in widths {
                if capture.queue.len() >= capture.maxlen {
                    capture.queue.pop_front();
                }
                capture.queue.push_back(width);
            }
        }
    }

    /// Get a trigger that fires on level changes.
    pub fn watch(&self, kind: TriggerKind) -> Trigger {
        let trigger = Trigger::new(kind);
        self.wire().triggers.push(trigger.clone());
        trigger
    }

    /// Number of device-side handles currently holding the pin.
    pub fn active_handles(&self) -> usize {
        self.wire().handles
    }

    pub fn is_capturing(&self) -> bool {
        self.wire().capture.is_some()
    }

    pub fn is_output(&self) -> bool {
        matches!(self.wire().direction, Direction::Output { .. })
    }

    /// Drive mode, if the device drives the pin.
    pub fn drive_mode(&self) -> Option<DriveMode> {
        match self.wire().direction {
            Direction::Output { drive_mode, .. } => Some(drive_mode),
            Direction::Input(_) => None,
        }
    }

    /// Pull resistor, if the pin is a device-side input.
    pub fn pull(&self) -> Option<Pull> {
        match self.wire().direction {
            Direction::Input(pull) => pull,
            Direction::Output { .. } => None,
        }
    }
}

impl PinProvider for SimPin {
    fn digital_io(&mut self) -> Box<dyn DigitalIo> {
        self.wire().claim();
        Box::new(SimDigitalIo { pin: self.clone() })
    }

    fn pulse_in(&mut self, maxlen: usize) -> Box<dyn PulseIn> {
        let mut wire = self.wire();
        wire.claim();
        wire.capture = Some(Capture {
            queue: VecDeque::with_capacity(maxlen),
            maxlen,
            last_edge: None,
        });
        drop(wire);
        Box::new(SimPulseIn { pin: self.clone() })
    }
}

#[derive(Debug)]
struct SimDigitalIo {
    pin: SimPin,
}

impl DigitalIo for SimDigitalIo {
    fn switch_to_input(&mut self, pull: Option<Pull>) {
        let mut wire = self.pin.wire();
        wire.direction = Direction::Input(pull);
        wire.update();
    }

    fn switch_to_output(&mut self, value: bool, drive_mode: DriveMode) {
        let mut wire = self.pin.wire();
        wire.direction = Direction::Output { value, drive_mode };
        wire.update();
    }

    fn set_drive_mode(&mut self, drive_mode: DriveMode) {
        let mut wire = self.pin.wire();
        if let Direction::Output { value, .. } = wire.direction {
            wire.direction = Direction::Output { value, drive_mode };
            wire.update();
        }
    }

    fn value(&mut self) -> bool {
        self.pin.level()
    }

    fn set_value(&mut self, value: bool) {
        let mut wire = self.pin.wire();
        if let Direction::Output { drive_mode, .. } = wire.direction {
            wire.direction = Direction::Output { value, drive_mode };
            wire.update();
        }
    }
}

impl Drop for SimDigitalIo {
    fn drop(&mut self) {
        self.pin.wire().release();
    }
}

#[derive(Debug)]
struct SimPulseIn {
    pin: SimPin,
}

impl PulseIn for SimPulseIn {
    fn len(&self) -> usize {
        match self.pin.wire().capture {
            Some(ref capture) => capture.queue.len(),
            None => 0,
        }
    }

    fn maxlen(&self) -> usize {
        match self.pin.wire().capture {
            Some(ref capture) => capture.maxlen,
            None => 0,
        }
    }

    fn popleft(&mut self) -> Option<u16> {
        self.pin.wire().capture.as_mut()?.queue.pop_front()
    }
}

impl Drop for SimPulseIn {
    fn drop(&mut self) {
        let mut wire = self.pin.wire();
        wire.capture = None;
        wire.release();
    }
}
