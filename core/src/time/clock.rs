use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::time::Duration;

pub const MICROS_PER_SECOND: u64 = 1_000_000;

pub const SECONDS_PER_MINUTE: u64 = 60;

pub const MICROS_PER_MINUTE: u64 = MICROS_PER_SECOND * SECONDS_PER_MINUTE;

/// Real time, in microseconds
#[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Default)]
pub struct ClockTime(u64);

impl ClockTime {
  pub fn zero() -> ClockTime {
    ClockTime(0)
  }

  pub fn from_micros(micros: u64) -> ClockTime {
    ClockTime(micros)
  }

  pub fn from_seconds(seconds: f64) -> ClockTime {
    if seconds <= 0.0 {
      ClockTime::zero()
    } else {
      ClockTime((seconds * MICROS_PER_SECOND as f64).round() as u64)
    }
  }

  pub fn micros(&self) -> u64 {
    self.0
  }

  pub fn whole_seconds(&self) -> u64 {
    self.0 / MICROS_PER_SECOND
  }

  pub fn to_seconds(&self) -> f64 {
    self.0 as f64 / MICROS_PER_SECOND as f64
  }

  pub fn to_duration(&self) -> Duration {
    Duration::from_micros(self.0)
  }

  /// Divides by a positive rate, e.g. a playback speed. Non-positive or non-finite rates leave the time untouched.
  pub fn scale_down(&self, rate: f64) -> ClockTime {
    if rate.is_finite() && rate > 0.0 {
      ClockTime((self.0 as f64 / rate).round() as u64)
    } else {
      *self
    }
  }
}

impl From<Duration> for ClockTime {
  fn from(item: Duration) -> Self {
    let micros = item.as_secs() * MICROS_PER_SECOND + u64::from(item.subsec_micros());
    ClockTime(micros)
  }
}

impl Add for ClockTime {
  type Output = ClockTime;

  fn add(self, rhs: ClockTime) -> ClockTime {
    ClockTime(self.0.saturating_add(rhs.0))
  }
}

impl AddAssign for ClockTime {
  fn add_assign(&mut self, rhs: ClockTime) {
    *self = *self + rhs;
  }
}

impl Sub for ClockTime {
  type Output = ClockTime;

  fn sub(self, rhs: ClockTime) -> ClockTime {
    ClockTime(self.0.saturating_sub(rhs.0))
  }
}

impl SubAssign for ClockTime {
  fn sub_assign(&mut self, rhs: ClockTime) {
    *self = *self - rhs;
  }
}

/// Formats as `M:SS`, the way elapsed playing time is reported.
impl fmt::Display for ClockTime {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let seconds = self.whole_seconds();
    write!(
      f,
      "{}:{:02}",
      seconds / SECONDS_PER_MINUTE,
      seconds % SECONDS_PER_MINUTE
    )
  }
}
