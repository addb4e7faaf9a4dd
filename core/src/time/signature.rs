use std::fmt;

/// Denominator exponent assumed when a score carries no time signature.
pub const DEFAULT_DENOMINATOR_EXPONENT: u8 = 2;

/// Size of a time signature meta message: status, type and four data bytes.
pub const TIME_SIGNATURE_MESSAGE_LEN: usize = 6;

/// Time signature as stored in the score. The all-zero default means the score has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSignature {
  numerator: u8,
  denominator_exponent: u8,
  clocks_per_click: u8,
  thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
  pub fn new(
    numerator: u8,
    denominator_exponent: u8,
    clocks_per_click: u8,
    thirty_seconds_per_quarter: u8,
  ) -> TimeSignature {
    TimeSignature {
      numerator,
      denominator_exponent,
      clocks_per_click,
      thirty_seconds_per_quarter,
    }
  }

  /// Reads the four data bytes of a time signature meta event.
  /// `None` unless the whole message would be exactly six bytes long.
  pub fn from_meta_bytes(data: &[u8]) -> Option<TimeSignature> {
    if data.len() + 2 != TIME_SIGNATURE_MESSAGE_LEN {
      return None;
    }
    Some(TimeSignature::new(data[0], data[1], data[2], data[3]))
  }

  pub fn is_present(&self) -> bool {
    *self != TimeSignature::default()
  }

  pub fn numerator(&self) -> u8 {
    self.numerator
  }

  pub fn denominator_exponent(&self) -> u8 {
    self.denominator_exponent
  }

  pub fn denominator_exponent_or_quarter(&self) -> u8 {
    if self.is_present() {
      self.denominator_exponent
    } else {
      DEFAULT_DENOMINATOR_EXPONENT
    }
  }

  /// Note value of the beat, `None` when it does not fit in a u32.
  pub fn denominator(&self) -> Option<u32> {
    2u32.checked_pow(u32::from(self.denominator_exponent))
  }

  pub fn clocks_per_click(&self) -> u8 {
    self.clocks_per_click
  }

  pub fn thirty_seconds_per_quarter(&self) -> u8 {
    self.thirty_seconds_per_quarter
  }
}

impl fmt::Display for TimeSignature {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.denominator() {
      Some(denominator) if self.is_present() => write!(f, "{}/{}", self.numerator, denominator),
      _ => write!(f, "-"),
    }
  }
}

#[cfg(test)]
mod test {

  use super::TimeSignature;

  #[test]
  pub fn signature_new() {
    let signature = TimeSignature::new(3, 2, 24, 8);
    assert_eq!(signature.numerator(), 3);
    assert_eq!(signature.denominator_exponent(), 2);
    assert_eq!(signature.denominator(), Some(4));
    assert_eq!(signature.clocks_per_click(), 24);
    assert_eq!(signature.thirty_seconds_per_quarter(), 8);
  }

  #[test]
  pub fn signature_default_is_absent() {
    let signature = TimeSignature::default();
    assert!(!signature.is_present());
    assert_eq!(signature.denominator_exponent_or_quarter(), 2);
    assert_eq!(signature.to_string(), "-");
  }

  #[test]
  pub fn signature_from_meta_bytes() {
    let signature = TimeSignature::from_meta_bytes(&[6, 3, 36, 8]);
    assert_eq!(signature, Some(TimeSignature::new(6, 3, 36, 8)));
    assert_eq!(TimeSignature::from_meta_bytes(&[6, 3, 36]), None);
    assert_eq!(TimeSignature::from_meta_bytes(&[6, 3, 36, 8, 0]), None);
  }

  #[test]
  pub fn signature_display() {
    assert_eq!(TimeSignature::new(6, 3, 36, 8).to_string(), "6/8");
  }
}
