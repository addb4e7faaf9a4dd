use std::fmt;

use crate::time::TicksTime;

pub const INTRO_BEGIN: &str = "[";
pub const INTRO_END: &str = "]";
pub const RITARDANDO: &str = "\\";
pub const DA_CAPO_AL_FINE: &str = "D.C. al Fine";
pub const FINE: &str = "Fine";

/// Meta event types used by older scores for the verse count and the pause between verses.
pub const LEGACY_META_VERSES: u8 = 0x10;
pub const LEGACY_META_PAUSE: u8 = 0x11;

/// Manufacturer id of the private sequencer-specific events.
pub const PRIVATE_MANUFACTURER: u8 = 0x7d;
pub const PRIVATE_VERSES: u8 = 0x01;
pub const PRIVATE_PAUSE: u8 = 0x02;

/// Musical direction carried by a score, whatever the encoding it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
  IntroBegin,
  IntroEnd,
  Ritardando,
  DaCapoAlFine,
  Fine,
  /// Number of verses. Zero when the encoded value was not a digit.
  Verses(u8),
  Pause(TicksTime),
  Text(String),
}

impl Marker {
  pub fn from_text(text: &str) -> Marker {
    match text {
      INTRO_BEGIN => Marker::IntroBegin,
      INTRO_END => Marker::IntroEnd,
      RITARDANDO => Marker::Ritardando,
      DA_CAPO_AL_FINE => Marker::DaCapoAlFine,
      FINE => Marker::Fine,
      other => Marker::Text(other.to_string()),
    }
  }

  /// Reads the deprecated verse and pause meta events.
  pub fn from_legacy_meta(kind: u8, data: &[u8]) -> Option<Marker> {
    match kind {
      LEGACY_META_VERSES => data.first().map(|c| Marker::Verses(ascii_digit(*c))),
      LEGACY_META_PAUSE => pause_ticks(data).map(Marker::Pause),
      _ => None,
    }
  }

  /// Reads a private sequencer-specific event. The payload may start with a length byte.
  pub fn from_sequencer_specific(data: &[u8]) -> Option<Marker> {
    let start = match data.first() {
      Some(&PRIVATE_MANUFACTURER) => 0,
      Some(_) => 1,
      None => return None,
    };
    let payload = data.get(start..)?;
    if payload.first() != Some(&PRIVATE_MANUFACTURER) {
      return None;
    }
    match payload.get(1) {
      Some(&PRIVATE_VERSES) => payload.get(2).map(|c| Marker::Verses(ascii_digit(*c))),
      Some(&PRIVATE_PAUSE) => pause_ticks(&payload[2..]).map(Marker::Pause),
      _ => None,
    }
  }

  /// Verse counts and pauses only make sense as score metadata.
  pub fn is_metadata(&self) -> bool {
    match self {
      Marker::Verses(_) | Marker::Pause(_) => true,
      _ => false,
    }
  }
}

impl fmt::Display for Marker {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Marker::IntroBegin => write!(f, "{}", INTRO_BEGIN),
      Marker::IntroEnd => write!(f, "{}", INTRO_END),
      Marker::Ritardando => write!(f, "{}", RITARDANDO),
      Marker::DaCapoAlFine => write!(f, "{}", DA_CAPO_AL_FINE),
      Marker::Fine => write!(f, "{}", FINE),
      Marker::Verses(count) => write!(f, "verses={}", count),
      Marker::Pause(ticks) => write!(f, "pause={}", ticks),
      Marker::Text(text) => write!(f, "{}", text),
    }
  }
}

fn ascii_digit(c: u8) -> u8 {
  if c.is_ascii_digit() {
    c - b'0'
  } else {
    0
  }
}

fn pause_ticks(data: &[u8]) -> Option<TicksTime> {
  match data {
    [msb, lsb, ..] => Some(TicksTime::new(u64::from(u16::from_be_bytes([*msb, *lsb])))),
    _ => None,
  }
}

#[cfg(test)]
mod test {

  use super::*;

  #[test]
  pub fn text_markers() {
    assert_eq!(Marker::from_text("["), Marker::IntroBegin);
    assert_eq!(Marker::from_text("]"), Marker::IntroEnd);
    assert_eq!(Marker::from_text("\\"), Marker::Ritardando);
    assert_eq!(Marker::from_text("D.C. al Fine"), Marker::DaCapoAlFine);
    assert_eq!(Marker::from_text("Fine"), Marker::Fine);
    assert_eq!(Marker::from_text("Chorus"), Marker::Text("Chorus".to_string()));
  }

  #[test]
  pub fn legacy_markers() {
    assert_eq!(Marker::from_legacy_meta(0x10, b"3"), Some(Marker::Verses(3)));
    assert_eq!(Marker::from_legacy_meta(0x10, b"x"), Some(Marker::Verses(0)));
    assert_eq!(
      Marker::from_legacy_meta(0x11, &[0x01, 0xe0]),
      Some(Marker::Pause(TicksTime::new(480)))
    );
    assert_eq!(Marker::from_legacy_meta(0x11, &[0x01]), None);
    assert_eq!(Marker::from_legacy_meta(0x12, b"3"), None);
  }

  #[test]
  pub fn sequencer_specific_markers() {
    assert_eq!(Marker::from_sequencer_specific(&[0x7d, 0x01, b'4']), Some(Marker::Verses(4)));
    assert_eq!(
      Marker::from_sequencer_specific(&[0x03, 0x7d, 0x01, b'2']),
      Some(Marker::Verses(2))
    );
    assert_eq!(
      Marker::from_sequencer_specific(&[0x04, 0x7d, 0x02, 0x03, 0xc0]),
      Some(Marker::Pause(TicksTime::new(960)))
    );
    assert_eq!(Marker::from_sequencer_specific(&[0x7d, 0x09, 0x00]), None);
    assert_eq!(Marker::from_sequencer_specific(&[0x41, 0x10, 0x42]), None);
    assert_eq!(Marker::from_sequencer_specific(&[]), None);
  }

  #[test]
  pub fn legacy_and_private_markers_are_the_same() {
    assert_eq!(
      Marker::from_legacy_meta(0x10, b"2"),
      Marker::from_sequencer_specific(&[0x7d, 0x01, b'2'])
    );
  }
}
