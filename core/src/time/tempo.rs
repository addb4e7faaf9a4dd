use std::fmt;

use crate::time::TimeSignature;

pub const MICROSECONDS_PER_MINUTE: u64 = 60_000_000;

/// A time signature denominator is stored as a power of two; this is the quarter note.
pub const QUARTER_NOTE_DENOMINATOR: u64 = 4;

pub const DEFAULT_USEC_PER_QUARTER: u32 = 500_000;

/// Tempo as microseconds per quarter note, the unit used by tempo meta events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo(u32);

impl Tempo {
  pub fn new(usec_per_quarter: u32) -> Tempo {
    Tempo(usec_per_quarter)
  }

  /// Builds a tempo from the 24-bit big-endian payload of a tempo meta event.
  pub fn from_meta_bytes(data: &[u8]) -> Option<Tempo> {
    if data.len() != 3 {
      return None;
    }
    let value = (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2]);
    Some(Tempo(value))
  }

  pub fn usec_per_quarter(&self) -> u32 {
    self.0
  }

  /// Quarter notes per minute, truncated. Zero when the tempo itself is zero.
  pub fn quarters_per_minute(&self) -> u64 {
    if self.0 == 0 {
      0
    } else {
      MICROSECONDS_PER_MINUTE / u64::from(self.0)
    }
  }

  /// Beats per minute, with the beat taken from the signature denominator.
  /// `None` when the arithmetic does not fit.
  pub fn beats_per_minute(&self, signature: &TimeSignature) -> Option<u64> {
    let exponent = u32::from(signature.denominator_exponent_or_quarter());
    let scale = 2u64.checked_pow(exponent)?;
    self
      .quarters_per_minute()
      .checked_mul(scale)
      .map(|value| value / QUARTER_NOTE_DENOMINATOR)
  }
}

impl Default for Tempo {
  fn default() -> Tempo {
    Tempo(DEFAULT_USEC_PER_QUARTER)
  }
}

impl From<Tempo> for u64 {
  fn from(item: Tempo) -> Self {
    u64::from(item.0)
  }
}

impl fmt::Display for Tempo {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} us/quarter", self.0)
  }
}
