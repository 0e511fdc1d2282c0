use chrono::{DateTime, Utc};

/// Wall-clock access as an explicit collaborator, so the fetch engine's
/// retry logic and timeslot rounding can be driven deterministically in
/// tests instead of racing real time.
pub trait Clock {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that always returns a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}
