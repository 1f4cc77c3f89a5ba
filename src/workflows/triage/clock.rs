use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};

/// Source of the instant used to stamp new records.
///
/// The offset is kept so records can carry local wall time while identifiers count true epoch
/// milliseconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock pinned to a wall time at UTC.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0.and_utc().fixed_offset()
    }
}
