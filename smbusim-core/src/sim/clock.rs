use chrono::{Duration, Local, NaiveDateTime};

use crate::hw::{Clock, ClockError, DateTime};

/// Simulated real-time clock.
#[derive(Debug)]
pub enum SimClock {
    /// Time stands still, apart from when it's set.
    Fixed(DateTime),
    /// Local wall-clock time, plus whatever offset setting the clock added.
    /// The weekday is kept as a separate offset, as it needn't match the date.
    System { offset: Duration, weekday: u8 },
}

impl SimClock {
    pub fn fixed(t: DateTime) -> SimClock {
        SimClock::Fixed(t)
    }

    pub fn system() -> SimClock {
        SimClock::System {
            offset: Duration::zero(),
            weekday: 0,
        }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl Clock for SimClock {
    fn datetime(&mut self) -> DateTime {
        match self {
            SimClock::Fixed(t) => *t,
            SimClock::System { offset, weekday } => {
                let mut t = DateTime::from_naive(&(SimClock::now() + *offset));
                t.weekday = (t.weekday + *weekday) % 7;
                t
            }
        }
    }

    fn set_datetime(&mut self, t: DateTime) -> Result<(), ClockError> {
        let naive = t.normalized().ok_or(ClockError(t))?;
        let date = DateTime::from_naive(&naive);
        // keep the weekday as given, like the real chip does
        match self {
            SimClock::Fixed(fixed) => {
                *fixed = DateTime {
                    weekday: t.weekday,
                    ..date
                }
            }
            SimClock::System { offset, weekday } => {
                *offset = naive - SimClock::now();
                *weekday = (t.weekday % 7 + 7 - date.weekday) % 7;
            }
        }
        Ok(())
    }
}
