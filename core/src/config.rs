use failure::Error;

use log::warn;

use serde_derive::Deserialize;

use std::fs::File;
use std::io::Read;

use crate::midi::types::{U4, U7, MAX_CHANNEL, MAX_NOTE};
use crate::midi::NoteSpace;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Playback {
  pub play_intro: bool,
  pub intro_repeats: u32,
  pub speed: f64,
  pub verbose: bool,
  pub display_warnings: bool,
  /// Overrides the verse count of the score.
  pub verses: Option<u32>,
  /// Overrides the tempo of the score, in beats per minute.
  pub tempo: Option<u32>,
}

impl Playback {
  /// The configured speed, or 1.0 when it is not a positive number.
  pub fn speed(&self) -> f64 {
    if self.speed.is_finite() && self.speed > 0.0 {
      self.speed
    } else {
      warn!("Ignoring invalid playback speed {}", self.speed);
      1.0
    }
  }

  pub fn reports_warnings(&self) -> bool {
    self.verbose || self.display_warnings
  }
}

impl Default for Playback {
  fn default() -> Playback {
    Playback {
      play_intro: true,
      intro_repeats: 0,
      speed: 1.0,
      verbose: false,
      display_warnings: false,
      verses: None,
      tempo: None,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Ritardando {
  /// Lowest tempo multiplier, reached at the end of the span.
  pub floor: f64,
  pub span_beats: f64,
  /// The multiplier is recomputed every this many events.
  pub heartbeat_events: u32,
}

impl Ritardando {
  pub fn floor(&self) -> f64 {
    if self.floor.is_finite() && self.floor > 0.0 {
      self.floor.min(1.0)
    } else {
      warn!("Ignoring invalid ritardando floor {}", self.floor);
      Ritardando::default().floor
    }
  }

  pub fn heartbeat_events(&self) -> u32 {
    self.heartbeat_events.max(1)
  }
}

impl Default for Ritardando {
  fn default() -> Ritardando {
    Ritardando {
      floor: 0.6,
      span_beats: 4.0,
      heartbeat_events: 4,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Output {
  pub first_channel: U4,
  pub last_channel: U4,
  pub lowest_note: U7,
  pub highest_note: U7,
}

impl Output {
  pub fn note_space(&self) -> NoteSpace {
    NoteSpace::new(
      self.first_channel..=self.last_channel,
      self.lowest_note..=self.highest_note,
    )
  }
}

impl Default for Output {
  fn default() -> Output {
    Output {
      first_channel: 0,
      last_channel: MAX_CHANNEL,
      lowest_note: 0,
      highest_note: MAX_NOTE,
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub playback: Playback,
  pub ritardando: Ritardando,
  pub output: Output,
}

impl Config {
  pub fn from_file<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let mut content = String::new();
    let path_str = path.into();
    let mut file = File::open(path_str)?;
    file.read_to_string(&mut content)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
  }

  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }
}

#[cfg(test)]
mod test {

  use super::Config;

  #[test]
  pub fn defaults() {
    let config = Config::from_str("").unwrap();
    assert!(config.playback.play_intro);
    assert_eq!(config.playback.intro_repeats, 0);
    assert_eq!(config.playback.speed(), 1.0);
    assert_eq!(config.playback.verses, None);
    assert_eq!(config.ritardando.floor(), 0.6);
    assert_eq!(config.ritardando.heartbeat_events(), 4);
    assert_eq!(config.output.note_space().len(), 16 * 128);
  }

  #[test]
  pub fn parse_sections() {
    let content = r#"
      [playback]
      play_intro = false
      intro_repeats = 2
      speed = 1.25
      verses = 3
      tempo = 90

      [ritardando]
      floor = 0.5
      span_beats = 2.0
      heartbeat_events = 1

      [output]
      first_channel = 0
      last_channel = 3
      lowest_note = 36
      highest_note = 96
    "#;
    let config = Config::from_str(content).unwrap();
    assert!(!config.playback.play_intro);
    assert_eq!(config.playback.intro_repeats, 2);
    assert_eq!(config.playback.speed(), 1.25);
    assert_eq!(config.playback.verses, Some(3));
    assert_eq!(config.playback.tempo, Some(90));
    assert_eq!(config.ritardando.floor(), 0.5);
    assert_eq!(config.ritardando.span_beats, 2.0);
    assert_eq!(config.output.note_space().len(), 4 * 61);
  }

  #[test]
  pub fn invalid_values_fall_back() {
    let content = r#"
      [playback]
      speed = -2.0

      [ritardando]
      floor = 0.0
      heartbeat_events = 0
    "#;
    let config = Config::from_str(content).unwrap();
    assert_eq!(config.playback.speed(), 1.0);
    assert_eq!(config.ritardando.floor(), 0.6);
    assert_eq!(config.ritardando.heartbeat_events(), 1);
  }

  #[test]
  pub fn floor_is_clamped() {
    let config = Config::from_str("[ritardando]\nfloor = 1.5").unwrap();
    assert_eq!(config.ritardando.floor(), 1.0);
  }
}
