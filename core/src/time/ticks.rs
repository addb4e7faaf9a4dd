use std::{
  cmp::{min, Ordering},
  fmt,
  ops::{Add, AddAssign, Sub, SubAssign},
};

use crate::time::{ClockTime, Tempo};

/// Score resolution: ticks per quarter note, as declared by the score header.
pub type Resolution = u16;

/// Position or distance on the score timeline, in the score's native ticks.
#[derive(Debug, Eq, Copy, Clone, Hash, Default)]
pub struct TicksTime(u64);

impl TicksTime {
  pub fn new(ticks: u64) -> TicksTime {
    TicksTime(ticks)
  }

  pub fn zero() -> TicksTime {
    TicksTime(0)
  }

  pub fn from_beats(beats: f64, resolution: Resolution) -> TicksTime {
    if beats <= 0.0 {
      TicksTime::zero()
    } else {
      TicksTime((beats * f64::from(resolution)).round() as u64)
    }
  }

  pub fn is_zero(&self) -> bool {
    self.0 == 0
  }

  /// Real time taken by these ticks at the given tempo, before any speed scaling.
  pub fn to_clock(&self, tempo: Tempo, resolution: Resolution) -> ClockTime {
    if resolution == 0 {
      return ClockTime::zero();
    }
    let micros = u128::from(self.0) * u128::from(tempo.usec_per_quarter()) / u128::from(resolution);
    ClockTime::from_micros(micros.min(u128::from(u64::max_value())) as u64)
  }
}

impl Ord for TicksTime {
  fn cmp(&self, other: &TicksTime) -> Ordering {
    self.0.cmp(&other.0)
  }
}

impl PartialOrd for TicksTime {
  fn partial_cmp(&self, other: &TicksTime) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for TicksTime {
  fn eq(&self, other: &TicksTime) -> bool {
    self.0 == other.0
  }
}

impl Add for TicksTime {
  type Output = TicksTime;
  fn add(self, rhs: TicksTime) -> Self {
    TicksTime::new(self.0.saturating_add(rhs.0))
  }
}

impl AddAssign for TicksTime {
  fn add_assign(&mut self, rhs: TicksTime) {
    *self = *self + rhs;
  }
}

impl Sub for TicksTime {
  type Output = TicksTime;
  fn sub(self, rhs: TicksTime) -> Self {
    TicksTime::new(self.0 - min(self.0, rhs.0))
  }
}

impl SubAssign for TicksTime {
  fn sub_assign(&mut self, rhs: TicksTime) {
    *self = *self - rhs;
  }
}

impl From<TicksTime> for f64 {
  fn from(item: TicksTime) -> Self {
    item.0 as f64
  }
}

impl From<TicksTime> for u64 {
  fn from(item: TicksTime) -> Self {
    item.0
  }
}

impl From<u64> for TicksTime {
  fn from(item: u64) -> Self {
    TicksTime(item)
  }
}

impl fmt::Display for TicksTime {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
