use crate::hw::{DigitalIo, DriveMode, PinProvider, Pull, PulseIn};

/// Default pulse queue capacity.
pub const DEFAULT_PULSE_CAPACITY: usize = 10;

/// How the expander has configured a pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PinMode {
    Input { pull: Option<Pull>, interrupt: bool },
    Output { value: bool },
}

/// The hardware primitive currently claimed for a pin. At most one is ever
/// held at a time.
#[derive(Debug)]
enum Backing {
    Unbound,
    LevelSensing(Box<dyn DigitalIo>),
    PulseSensing {
        pulses: Box<dyn PulseIn>,
        /// Last known level, if any.
        last: Option<bool>,
        /// Nothing drained since capture started.
        fresh: bool,
    },
}

/// Level derived from the number of pulses drained from a capture queue.
/// Lines of unknown level are assumed to idle low.
///
/// Returns `None` when the level can't be reconstructed, and must be sensed
/// directly.
fn infer_level(n: usize, maxlen: usize, last: Option<bool>, fresh: bool) -> Option<bool> {
    if n == 0 {
        return last;
    }
    if n >= maxlen {
        // edges were dropped
        return None;
    }

    // the edge which started the first pulse of a capture isn't a pulse
    let edges = if fresh { n + 1 } else { n };
    Some(last.unwrap_or(false) ^ (edges % 2 == 1))
}

/// One of the expander's pins.
///
/// Interrupt-on-change inputs are backed by pulse capture, since edges are the
/// only thing that can't be missed between two polls. Their level is
/// reconstructed from the parity of the edges seen since the last known level.
#[derive(Debug)]
pub struct VirtualPin {
    index: usize,
    provider: Option<Box<dyn PinProvider>>,
    backing: Backing,
    mode: PinMode,
    capacity: usize,
    interrupt: bool,
}

impl VirtualPin {
    /// Create a new pin, configured as a plain input. Pins without a
    /// `provider` aren't connected to anything.
    pub fn new(index: usize, provider: Option<Box<dyn PinProvider>>) -> VirtualPin {
        let mut pin = VirtualPin {
            index,
            provider,
            backing: Backing::Unbound,
            mode: PinMode::Input {
                pull: None,
                interrupt: false,
            },
            capacity: DEFAULT_PULSE_CAPACITY,
            interrupt: false,
        };
        if let Some(io) = pin.ensure_io() {
            io.switch_to_input(None);
        }
        pin
    }

    /// Set the pulse queue capacity. Takes effect the next time the pin
    /// starts pulse capture.
    pub fn set_pulse_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    pub fn is_connected(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_pulse_sensing(&self) -> bool {
        matches!(self.backing, Backing::PulseSensing { .. })
    }

    /// Claim the pin for level access, releasing any pulse capture first.
    fn ensure_io(&mut self) -> Option<&mut Box<dyn DigitalIo>> {
        let provider = self.provider.as_mut()?;
        if !matches!(self.backing, Backing::LevelSensing(_)) {
            self.backing = Backing::Unbound;
            trace!(target: "PIN", "{}: DigitalIo", self.index);
            self.backing = Backing::LevelSensing(provider.digital_io());
        }

        match self.backing {
            Backing::LevelSensing(ref mut io) => Some(io),
            _ => None,
        }
    }

    /// Claim the pin for pulse capture, releasing any level access first.
    fn ensure_pulse_in(&mut self) {
        let provider = match self.provider.as_mut() {
            Some(provider) => provider,
            None => return,
        };
        if let Backing::PulseSensing { .. } = self.backing {
            return;
        }

        self.backing = Backing::Unbound;
        trace!(target: "PIN", "{}: PulseIn(maxlen={})", self.index, self.capacity);
        self.backing = Backing::PulseSensing {
            pulses: provider.pulse_in(self.capacity),
            last: None,
            fresh: true,
        };
    }

    pub fn switch_to_output(&mut self, value: bool) {
        self.mode = PinMode::Output { value };
        if let Some(io) = self.ensure_io() {
            io.switch_to_output(value, DriveMode::PushPull);
        }
    }

    /// Pull-ups aren't available on interrupt-on-change pins, since they are
    /// in pulse capture.
    pub fn switch_to_input(&mut self, pull: Option<Pull>, interrupt: bool) {
        self.mode = PinMode::Input { pull, interrupt };
        if interrupt {
            if pull.is_some() {
                debug!(target: "PIN", "{}: pull ignored on interrupt pin", self.index);
            }
            self.ensure_pulse_in();
        } else if let Some(io) = self.ensure_io() {
            io.switch_to_input(pull);
        }
    }

    /// Drive an output pin. Writes to inputs are ignored.
    pub fn set_value(&mut self, value: bool) {
        match self.mode {
            PinMode::Output { .. } => self.mode = PinMode::Output { value },
            PinMode::Input { .. } => {
                debug!(target: "PIN", "{}: ignoring write to input", self.index);
                return;
            }
        }

        if let Backing::LevelSensing(ref mut io) = self.backing {
            io.set_value(value);
        }
    }

    /// Level of an unconnected pin.
    fn floating_level(&self) -> bool {
        match self.mode {
            PinMode::Output { value } => value,
            PinMode::Input { pull, .. } => pull == Some(Pull::Up),
        }
    }

    /// Briefly switch a pulse capturing pin over to level access to read the
    /// pin directly, then resume capture with the sensed level as ground truth.
    fn resense(&mut self) -> bool {
        let provider = match self.provider.as_mut() {
            Some(provider) => provider,
            None => return false,
        };

        self.backing = Backing::Unbound;
        let level = {
            let mut io = provider.digital_io();
            io.switch_to_input(None);
            io.value()
        };
        trace!(target: "PIN", "{}: re-sensed level {}", self.index, level);

        self.backing = Backing::PulseSensing {
            pulses: provider.pulse_in(self.capacity),
            last: Some(level),
            fresh: true,
        };
        level
    }

    /// Drain the pulse queue, updating the last known level and the pending
    /// interrupt flag.
    fn sense_pulses(&mut self) -> bool {
        let (n, level) = match self.backing {
            Backing::PulseSensing {
                ref mut pulses,
                ref mut last,
                ref mut fresh,
            } => {
                let n = pulses.len();
                for _ in 0..n {
                    pulses.popleft();
                }

                let level = infer_level(n, pulses.maxlen(), *last, *fresh);
                if n > 0 {
                    *fresh = false;
                }
                if level.is_some() {
                    *last = level;
                }
                (n, level)
            }
            _ => return false,
        };

        if n > 0 {
            trace!(target: "PIN", "{}: {} pulses", self.index, n);
            self.interrupt = true;
        }

        match level {
            Some(level) => level,
            None => self.resense(),
        }
    }

    /// Current level on the pin.
    pub fn value(&mut self) -> bool {
        if self.provider.is_none() {
            return self.floating_level();
        }

        match self.backing {
            Backing::LevelSensing(ref mut io) => io.value(),
            Backing::PulseSensing { .. } => self.sense_pulses(),
            Backing::Unbound => {
                warn!(target: "PIN", "{}: read from unbound pin", self.index);
                false
            }
        }
    }

    /// Check for edges since the last poll. Returns true (once) if any were
    /// seen.
    pub fn poll(&mut self) -> bool {
        if self.is_pulse_sensing() {
            self.sense_pulses();
        }
        std::mem::replace(&mut self.interrupt, false)
    }
}
