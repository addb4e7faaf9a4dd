pub mod event;
pub mod key;
pub mod markers;
pub mod preprocessor;

pub use self::event::{Event, Payload, RawEvent, RawEventKind, RawScore};
pub use self::markers::Marker;
pub use self::preprocessor::EventPreProcessor;

use std::fmt;

use failure::Fail;

use crate::time::{Resolution, Tempo, TicksTime, TimeSignature};

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum DataError {
  #[fail(display = "Event at tick {} comes after tick {}", tick, previous)]
  TickOrder { tick: TicksTime, previous: TicksTime },

  #[fail(display = "Introduction end marker without a beginning at tick {}", tick)]
  UnbalancedIntroEnd { tick: TicksTime },

  #[fail(display = "Introduction starting at tick {} is never closed", tick)]
  UnclosedIntro { tick: TicksTime },

  #[fail(
    display = "Key signature with {} sharps/flats (minor: {}) at tick {} is out of range",
    sharps_flats, minor, tick
  )]
  KeySignatureOutOfRange {
    tick: TicksTime,
    sharps_flats: i8,
    minor: bool,
  },

  #[fail(display = "Time signature at tick {} is {} bytes long, expected 6", tick, size)]
  TimeSignatureSize { tick: TicksTime, size: usize },

  #[fail(display = "Tempo of {} us/quarter at tick {} overflows the file tempo", usec, tick)]
  TempoOverflow { tick: TicksTime, usec: u32 },

  #[fail(display = "The score resolution is zero ticks per quarter")]
  ZeroResolution,
}

pub type DataResult<T> = Result<T, DataError>;

/// A `[start, end)` range of the score played as introduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroductionSegment {
  pub start: TicksTime,
  pub end: TicksTime,
}

impl IntroductionSegment {
  pub fn new(start: TicksTime, end: TicksTime) -> IntroductionSegment {
    IntroductionSegment { start, end }
  }
}

/// Advisory findings of the pre-processing, reported but never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreWarning {
  DeprecatedVerses,
  DeprecatedPause,
  PotentialStuckNote,
}

impl fmt::Display for ScoreWarning {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ScoreWarning::DeprecatedVerses => write!(f, "Deprecated Meta event for number of verses found"),
      ScoreWarning::DeprecatedPause => write!(f, "Deprecated Meta event for pause found"),
      ScoreWarning::PotentialStuckNote => write!(f, "Potential stuck note"),
    }
  }
}

/// What the pre-processing extracted from the score, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Metadata {
  pub(crate) title: String,
  pub(crate) key_signature: String,
  pub(crate) time_signature: TimeSignature,
  pub(crate) tempo: Tempo,
  pub(crate) file_tempo: u64,
  pub(crate) verses: Option<u32>,
  pub(crate) pause: TicksTime,
  pub(crate) intro_segments: Vec<IntroductionSegment>,
  pub(crate) potential_stuck_note: bool,
  pub(crate) warnings: Vec<ScoreWarning>,
}

impl Metadata {
  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn key_signature(&self) -> &str {
    &self.key_signature
  }

  pub fn time_signature(&self) -> TimeSignature {
    self.time_signature
  }

  /// Tempo of the first tempo event, or the 120 qpm default.
  pub fn tempo(&self) -> Tempo {
    self.tempo
  }

  /// Beats per minute of the first tempo, for the beat given by the time signature.
  pub fn file_tempo(&self) -> u64 {
    self.file_tempo
  }

  /// Verse count found in the score, if any.
  pub fn verses(&self) -> Option<u32> {
    self.verses
  }

  pub fn pause(&self) -> TicksTime {
    self.pause
  }

  pub fn intro_segments(&self) -> &[IntroductionSegment] {
    &self.intro_segments
  }

  pub fn has_intro(&self) -> bool {
    !self.intro_segments.is_empty()
  }

  pub fn has_potential_stuck_note(&self) -> bool {
    self.potential_stuck_note
  }

  pub fn warnings(&self) -> &[ScoreWarning] {
    &self.warnings
  }
}

impl Default for Metadata {
  fn default() -> Metadata {
    Metadata {
      title: String::new(),
      key_signature: String::new(),
      time_signature: TimeSignature::default(),
      tempo: Tempo::default(),
      file_tempo: 120,
      verses: None,
      pause: TicksTime::zero(),
      intro_segments: Vec::new(),
      potential_stuck_note: false,
      warnings: Vec::new(),
    }
  }
}

/// The annotated score: events in tick order plus their metadata.
#[derive(Debug, Clone)]
pub struct Score {
  resolution: Resolution,
  events: Vec<Event>,
  end: TicksTime,
  metadata: Metadata,
}

impl Score {
  pub fn new(resolution: Resolution, events: Vec<Event>, end: TicksTime, metadata: Metadata) -> Score {
    let end = events.last().map_or(end, |event| event.tick.max(end));
    Score {
      resolution,
      events,
      end,
      metadata,
    }
  }

  pub fn resolution(&self) -> Resolution {
    self.resolution
  }

  pub fn events(&self) -> &[Event] {
    &self.events
  }

  /// Tick of the last event of any track, end of track events included.
  pub fn end(&self) -> TicksTime {
    self.end
  }

  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  /// Index of the first event at or after the tick.
  pub fn position_of(&self, tick: TicksTime) -> usize {
    self.events.iter().position(|event| event.tick >= tick).unwrap_or_else(|| self.events.len())
  }

  /// Tempo in effect when playing resumes at the tick, before the events at that tick.
  /// Ticks before the first tempo event play at the default tempo.
  pub fn tempo_at(&self, tick: TicksTime) -> Tempo {
    self
      .events
      .iter()
      .take_while(|event| event.tick < tick)
      .filter_map(|event| match event.payload {
        Payload::Tempo(tempo) => Some(tempo),
        _ => None,
      })
      .last()
      .unwrap_or_default()
  }
}
