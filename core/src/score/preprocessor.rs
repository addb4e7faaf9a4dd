use std::collections::HashMap;

use log::debug;

use crate::midi::types::{U4, U7};
use crate::midi::Message;
use crate::time::{Tempo, TicksTime, TimeSignature};

use super::event::*;
use super::key::key_name;
use super::markers::{Marker, LEGACY_META_PAUSE, LEGACY_META_VERSES};
use super::{
  DataError, DataResult, Event, IntroductionSegment, Metadata, Payload, Score, ScoreWarning,
};

const CC_DATA_ENTRY_MSB: U7 = 6;
const CC_DATA_ENTRY_LSB: U7 = 38;
const CC_NRPN_LSB: U7 = 98;
const CC_NRPN_MSB: U7 = 99;

/// Builds the annotated score in one forward pass over the merged raw events.
pub struct EventPreProcessor {
  metadata: Metadata,
  events: Vec<Event>,
  previous_tick: TicksTime,
  end: TicksTime,
  first_tempo: Option<Tempo>,
  open_intro: Option<usize>,
  sounding: HashMap<(U4, U7), usize>,
  last_note_off: TicksTime,
}

impl EventPreProcessor {
  pub fn new() -> EventPreProcessor {
    EventPreProcessor {
      metadata: Metadata::default(),
      events: Vec::new(),
      previous_tick: TicksTime::zero(),
      end: TicksTime::zero(),
      first_tempo: None,
      open_intro: None,
      sounding: HashMap::new(),
      last_note_off: TicksTime::zero(),
    }
  }

  pub fn process(mut self, raw: RawScore) -> DataResult<Score> {
    if raw.resolution == 0 {
      return Err(DataError::ZeroResolution);
    }

    for event in raw.events {
      self.process_event(event)?;
    }

    self.finish(raw.resolution)
  }

  fn process_event(&mut self, event: RawEvent) -> DataResult<()> {
    let RawEvent { tick, track, kind } = event;

    if tick < self.previous_tick {
      return Err(DataError::TickOrder {
        tick,
        previous: self.previous_tick,
      });
    }
    self.previous_tick = tick;
    self.end = self.end.max(tick);

    match kind {
      RawEventKind::SysEx(_) => Ok(()),
      RawEventKind::Channel(message) => {
        self.process_channel(tick, message);
        Ok(())
      }
      RawEventKind::Meta { kind, data } => self.process_meta(tick, track, kind, &data),
    }
  }

  fn process_channel(&mut self, tick: TicksTime, message: Message) {
    if let Message::ControlChange { controller, .. } = message {
      match controller {
        CC_NRPN_LSB | CC_NRPN_MSB | CC_DATA_ENTRY_MSB | CC_DATA_ENTRY_LSB => {}
        _ => return,
      }
    }

    if let Some(note) = message.sounding_note() {
      *self.sounding.entry(note).or_insert(0) += 1;
    } else if let Some(note) = message.released_note() {
      self.last_note_off = tick;
      if let Some(count) = self.sounding.get_mut(&note) {
        *count -= 1;
        if *count == 0 {
          self.sounding.remove(&note);
        }
      }
    }

    self.events.push(Event::new(tick, Payload::Channel(message)));
  }

  fn process_meta(&mut self, tick: TicksTime, track: usize, kind: u8, data: &[u8]) -> DataResult<()> {
    match kind {
      META_LYRIC => {}
      META_TRACK_NAME => {
        if self.metadata.title.is_empty() {
          self.metadata.title = String::from_utf8_lossy(data).trim().to_string();
        }
      }
      META_END_OF_TRACK => self.check_stuck_note_at_end_of_track(tick),
      META_TEMPO => {
        if let Some(tempo) = Tempo::from_meta_bytes(data) {
          if self.first_tempo.is_none() {
            self.first_tempo = Some(tempo);
          }
          self.events.push(Event::new(tick, Payload::Tempo(tempo)));
        }
      }
      META_TIME_SIGNATURE if tick.is_zero() => {
        let signature = TimeSignature::from_meta_bytes(data).ok_or(DataError::TimeSignatureSize {
          tick,
          size: data.len() + 2,
        })?;
        if !self.metadata.time_signature.is_present() {
          self.metadata.time_signature = signature;
        }
      }
      META_KEY_SIGNATURE if tick.is_zero() && data.len() >= 2 => {
        let sharps_flats = data[0] as i8;
        let minor = data[1] != 0;
        self.metadata.key_signature =
          key_name(sharps_flats, minor).ok_or(DataError::KeySignatureOutOfRange {
            tick,
            sharps_flats,
            minor,
          })?;
      }
      LEGACY_META_VERSES | LEGACY_META_PAUSE => {
        let warning = if kind == LEGACY_META_VERSES {
          ScoreWarning::DeprecatedVerses
        } else {
          ScoreWarning::DeprecatedPause
        };
        if tick.is_zero() {
          self.metadata.warnings.push(warning);
        }
        if let Some(marker) = Marker::from_legacy_meta(kind, data) {
          self.process_metadata_marker(tick, marker);
        }
      }
      META_SEQUENCER_SPECIFIC => {
        if let Some(marker) = Marker::from_sequencer_specific(data) {
          self.process_metadata_marker(tick, marker);
        }
      }
      META_MARKER => {
        let text = String::from_utf8_lossy(data);
        let marker = Marker::from_text(text.trim());
        self.process_text_marker(tick, track, marker)?;
      }
      _ => {}
    }
    Ok(())
  }

  /// Verses and pauses at time zero describe the score. A later pause is played where it is.
  fn process_metadata_marker(&mut self, tick: TicksTime, marker: Marker) {
    match marker {
      Marker::Verses(count) if tick.is_zero() => {
        if self.metadata.verses.is_none() && count > 0 {
          self.metadata.verses = Some(u32::from(count));
        }
      }
      Marker::Pause(ticks) if tick.is_zero() => self.metadata.pause = ticks,
      Marker::Pause(_) => self.events.push(Event::new(tick, Payload::Marker(marker))),
      _ => debug!("Ignoring marker {} at tick {}", marker, tick),
    }
  }

  fn process_text_marker(&mut self, tick: TicksTime, track: usize, marker: Marker) -> DataResult<()> {
    match marker {
      Marker::IntroBegin | Marker::IntroEnd if track != 0 => return Ok(()),
      Marker::IntroBegin => {
        if let Some(open) = self.open_intro {
          return Err(DataError::UnclosedIntro {
            tick: self.metadata.intro_segments[open].start,
          });
        }
        self.open_intro = Some(self.metadata.intro_segments.len());
        self
          .metadata
          .intro_segments
          .push(IntroductionSegment::new(tick, tick));
      }
      Marker::IntroEnd => {
        let open = self.open_intro.take().ok_or(DataError::UnbalancedIntroEnd { tick })?;
        self.metadata.intro_segments[open].end = tick;
      }
      _ => {}
    }
    self.events.push(Event::new(tick, Payload::Marker(marker)));
    Ok(())
  }

  fn check_stuck_note_at_end_of_track(&mut self, tick: TicksTime) {
    if let Some(last) = self.metadata.intro_segments.last() {
      if tick == last.end && self.last_note_off >= last.end {
        self.metadata.potential_stuck_note = true;
      }
    }
  }

  fn finish(mut self, resolution: u16) -> DataResult<Score> {
    if let Some(open) = self.open_intro {
      return Err(DataError::UnclosedIntro {
        tick: self.metadata.intro_segments[open].start,
      });
    }

    if !self.sounding.is_empty() {
      self.metadata.potential_stuck_note = true;
    }
    if self.metadata.potential_stuck_note {
      self.metadata.warnings.push(ScoreWarning::PotentialStuckNote);
    }

    let tempo = match self.first_tempo {
      Some(tempo) if tempo.usec_per_quarter() > 0 => tempo,
      _ => Tempo::default(),
    };
    self.metadata.tempo = tempo;
    self.metadata.file_tempo =
      tempo
        .beats_per_minute(&self.metadata.time_signature)
        .ok_or(DataError::TempoOverflow {
          tick: TicksTime::zero(),
          usec: tempo.usec_per_quarter(),
        })?;

    debug!(
      "Pre-processed {} events: tempo={} file_tempo={} intro_segments={:?}",
      self.events.len(),
      tempo,
      self.metadata.file_tempo,
      self.metadata.intro_segments
    );

    Ok(Score::new(resolution, self.events, self.end, self.metadata))
  }
}

impl Default for EventPreProcessor {
  fn default() -> EventPreProcessor {
    EventPreProcessor::new()
  }
}

#[cfg(test)]
mod test {

  use super::EventPreProcessor;
  use crate::midi::Message;
  use crate::score::event::*;
  use crate::score::markers::Marker;
  use crate::score::{DataError, IntroductionSegment, Payload, ScoreWarning};
  use crate::testing::{marker, note_off, note_on, ScoreBuilder};
  use crate::time::{Tempo, TicksTime, TimeSignature};

  #[test]
  pub fn empty_score_has_defaults() {
    let score = EventPreProcessor::new()
      .process(RawScore::new(480, vec![]))
      .unwrap();
    let metadata = score.metadata();
    assert_eq!(metadata.tempo(), Tempo::new(500_000));
    assert_eq!(metadata.file_tempo(), 120);
    assert_eq!(metadata.verses(), None);
    assert_eq!(metadata.key_signature(), "");
    assert!(!metadata.has_intro());
    assert!(score.events().is_empty());
  }

  #[test]
  pub fn zero_resolution() {
    let result = EventPreProcessor::new().process(RawScore::new(0, vec![]));
    assert_eq!(result.err(), Some(DataError::ZeroResolution));
  }

  #[test]
  pub fn tick_order_is_checked() {
    let raw = ScoreBuilder::new()
      .event(note_on(100, 0, 60))
      .event(note_off(50, 0, 60))
      .build();
    let result = EventPreProcessor::new().process(raw);
    assert_eq!(
      result.err(),
      Some(DataError::TickOrder {
        tick: TicksTime::new(50),
        previous: TicksTime::new(100),
      })
    );
  }

  #[test]
  pub fn same_tick_events_keep_their_order() {
    let raw = ScoreBuilder::new()
      .event(note_on(0, 0, 60))
      .event(note_on(0, 0, 64))
      .event(note_on(0, 0, 67))
      .event(note_off(10, 0, 60))
      .event(note_off(10, 0, 64))
      .event(note_off(10, 0, 67))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    let keys: Vec<u8> = score
      .events()
      .iter()
      .filter_map(|event| match event.payload {
        Payload::Channel(Message::NoteOn { key, .. }) => Some(key),
        Payload::Channel(Message::NoteOff { key, .. }) => Some(key),
        _ => None,
      })
      .collect();
    assert_eq!(keys, vec![60, 64, 67, 60, 64, 67]);
  }

  #[test]
  pub fn first_tempo_sets_file_tempo() {
    let raw = ScoreBuilder::new()
      .meta(0, META_TEMPO, &[0x09, 0x27, 0xc0])
      .meta(480, META_TEMPO, &[0x07, 0xa1, 0x20])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().tempo(), Tempo::new(600_000));
    assert_eq!(score.metadata().file_tempo(), 100);
    let tempos: Vec<&Payload> = score
      .events()
      .iter()
      .map(|event| &event.payload)
      .collect();
    assert_eq!(
      tempos,
      vec![&Payload::Tempo(Tempo::new(600_000)), &Payload::Tempo(Tempo::new(500_000))]
    );
  }

  #[test]
  pub fn file_tempo_uses_time_signature() {
    let raw = ScoreBuilder::new()
      .meta(0, META_TEMPO, &[0x07, 0xa1, 0x20])
      .meta(0, META_TIME_SIGNATURE, &[6, 3, 24, 8])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().time_signature(), TimeSignature::new(6, 3, 24, 8));
    assert_eq!(score.metadata().file_tempo(), 240);
  }

  #[test]
  pub fn zero_tempo_falls_back_to_default() {
    let raw = ScoreBuilder::new().meta(0, META_TEMPO, &[0, 0, 0]).build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().tempo(), Tempo::default());
    assert_eq!(score.metadata().file_tempo(), 120);
  }

  #[test]
  pub fn first_time_signature_wins() {
    let raw = ScoreBuilder::new()
      .meta(0, META_TIME_SIGNATURE, &[3, 2, 24, 8])
      .meta(0, META_TIME_SIGNATURE, &[4, 2, 24, 8])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().time_signature(), TimeSignature::new(3, 2, 24, 8));
  }

  #[test]
  pub fn wrong_size_time_signature() {
    let raw = ScoreBuilder::new()
      .meta(0, META_TIME_SIGNATURE, &[3, 2, 24])
      .build();
    let result = EventPreProcessor::new().process(raw);
    assert_eq!(
      result.err(),
      Some(DataError::TimeSignatureSize {
        tick: TicksTime::zero(),
        size: 5,
      })
    );
  }

  #[test]
  pub fn key_signature() {
    let raw = ScoreBuilder::new()
      .meta(0, META_KEY_SIGNATURE, &[0xfd, 1])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().key_signature(), "C minor");
  }

  #[test]
  pub fn key_signature_out_of_range() {
    let raw = ScoreBuilder::new()
      .meta(0, META_KEY_SIGNATURE, &[10, 1])
      .build();
    let result = EventPreProcessor::new().process(raw);
    assert_eq!(
      result.err(),
      Some(DataError::KeySignatureOutOfRange {
        tick: TicksTime::zero(),
        sharps_flats: 10,
        minor: true,
      })
    );
  }

  #[test]
  pub fn title_is_first_track_name() {
    let raw = ScoreBuilder::new()
      .meta(0, META_TRACK_NAME, b"Amazing Grace")
      .meta(0, META_TRACK_NAME, b"Organ")
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().title(), "Amazing Grace");
  }

  #[test]
  pub fn filters_events() {
    let raw = ScoreBuilder::new()
      .event(RawEvent::new(
        TicksTime::zero(),
        0,
        RawEventKind::SysEx(vec![0x43, 0x10]),
      ))
      .meta(0, META_LYRIC, b"Glo-")
      .event(RawEvent::channel(
        0,
        0,
        Message::ControlChange {
          channel: 0,
          controller: 7,
          value: 100,
        },
      ))
      .event(RawEvent::channel(
        0,
        0,
        Message::ControlChange {
          channel: 0,
          controller: 99,
          value: 1,
        },
      ))
      .event(RawEvent::channel(
        0,
        0,
        Message::ProgramChange {
          channel: 0,
          value: 19,
        },
      ))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.events().len(), 2);
  }

  #[test]
  pub fn legacy_metadata_markers() {
    let raw = ScoreBuilder::new()
      .meta(0, 0x10, b"3")
      .meta(0, 0x11, &[0x01, 0xe0])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    let metadata = score.metadata();
    assert_eq!(metadata.verses(), Some(3));
    assert_eq!(metadata.pause(), TicksTime::new(480));
    assert_eq!(
      metadata.warnings(),
      &[ScoreWarning::DeprecatedVerses, ScoreWarning::DeprecatedPause]
    );
    assert!(score.events().is_empty());
  }

  #[test]
  pub fn sequencer_specific_metadata_markers() {
    let raw = ScoreBuilder::new()
      .meta(0, META_SEQUENCER_SPECIFIC, &[0x03, 0x7d, 0x01, b'4'])
      .meta(0, META_SEQUENCER_SPECIFIC, &[0x7d, 0x01, b'2'])
      .meta(0, META_SEQUENCER_SPECIFIC, &[0x04, 0x7d, 0x02, 0x00, 0xf0])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().verses(), Some(4));
    assert_eq!(score.metadata().pause(), TicksTime::new(240));
    assert!(score.metadata().warnings().is_empty());
  }

  #[test]
  pub fn later_pause_stays_in_score() {
    let raw = ScoreBuilder::new()
      .meta(960, META_SEQUENCER_SPECIFIC, &[0x7d, 0x02, 0x01, 0xe0])
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(score.metadata().pause(), TicksTime::zero());
    assert_eq!(
      score.events()[0].payload,
      Payload::Marker(Marker::Pause(TicksTime::new(480)))
    );
  }

  #[test]
  pub fn intro_segments() {
    let raw = ScoreBuilder::new()
      .event(marker(10, 0, "["))
      .event(marker(50, 0, "]"))
      .event(marker(60, 0, "["))
      .event(marker(90, 0, "]"))
      .event(marker(95, 1, "["))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert_eq!(
      score.metadata().intro_segments(),
      &[
        IntroductionSegment::new(TicksTime::new(10), TicksTime::new(50)),
        IntroductionSegment::new(TicksTime::new(60), TicksTime::new(90)),
      ]
    );
    assert_eq!(score.events().len(), 4);
  }

  #[test]
  pub fn unbalanced_intro_end() {
    let raw = ScoreBuilder::new().event(marker(50, 0, "]")).build();
    let result = EventPreProcessor::new().process(raw);
    assert_eq!(
      result.err(),
      Some(DataError::UnbalancedIntroEnd {
        tick: TicksTime::new(50)
      })
    );
  }

  #[test]
  pub fn unclosed_intro() {
    let raw = ScoreBuilder::new().event(marker(10, 0, "[")).build();
    let result = EventPreProcessor::new().process(raw);
    assert_eq!(
      result.err(),
      Some(DataError::UnclosedIntro {
        tick: TicksTime::new(10)
      })
    );
  }

  #[test]
  pub fn directive_markers_are_kept() {
    let raw = ScoreBuilder::new()
      .event(marker(100, 0, "Fine"))
      .event(marker(200, 1, "D.C. al Fine"))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    let markers: Vec<&Payload> = score.events().iter().map(|e| &e.payload).collect();
    assert_eq!(
      markers,
      vec![
        &Payload::Marker(Marker::Fine),
        &Payload::Marker(Marker::DaCapoAlFine)
      ]
    );
  }

  #[test]
  pub fn unmatched_note_on_is_a_potential_stuck_note() {
    let raw = ScoreBuilder::new()
      .event(note_on(0, 0, 60))
      .event(note_on(0, 0, 64))
      .event(note_off(100, 0, 64))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert!(score.metadata().has_potential_stuck_note());
    assert_eq!(score.metadata().warnings(), &[ScoreWarning::PotentialStuckNote]);
  }

  #[test]
  pub fn note_off_at_intro_end_is_a_potential_stuck_note() {
    let raw = ScoreBuilder::new()
      .event(marker(0, 0, "["))
      .event(note_on(0, 0, 60))
      .event(note_off(100, 0, 60))
      .event(marker(100, 0, "]"))
      .event(RawEvent::end_of_track(100, 0))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert!(score.metadata().has_potential_stuck_note());
    assert_eq!(score.end(), TicksTime::new(100));
  }

  #[test]
  pub fn balanced_notes_are_fine() {
    let raw = ScoreBuilder::new()
      .event(note_on(0, 0, 60))
      .event(note_off(100, 0, 60))
      .event(RawEvent::end_of_track(120, 0))
      .build();
    let score = EventPreProcessor::new().process(raw).unwrap();
    assert!(!score.metadata().has_potential_stuck_note());
    assert_eq!(score.end(), TicksTime::new(120));
  }
}
