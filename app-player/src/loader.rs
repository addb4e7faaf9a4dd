//! Standard MIDI File reading.

use std::fs;

use failure::Fail;

use log::debug;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use organ_play_core::midi::Message;
use organ_play_core::score::event::{
  META_END_OF_TRACK, META_KEY_SIGNATURE, META_LYRIC, META_MARKER, META_SEQUENCER_SPECIFIC, META_TEMPO,
  META_TIME_SIGNATURE, META_TRACK_NAME,
};
use organ_play_core::score::{RawEvent, RawEventKind, RawScore};
use organ_play_core::time::TicksTime;

const META_TEXT: u8 = 0x01;
const META_COPYRIGHT: u8 = 0x02;
const META_INSTRUMENT_NAME: u8 = 0x04;
const META_CUE_POINT: u8 = 0x07;

#[derive(Debug, Fail)]
pub enum LoadError {
  #[fail(display = "Failed to read {}: {}", path, cause)]
  Read { path: String, cause: String },

  #[fail(display = "Invalid MIDI file: {}", cause)]
  Parse { cause: String },

  #[fail(display = "Only metrical timing is supported, found {}", timing)]
  UnsupportedTiming { timing: String },
}

pub type LoadResult<T> = Result<T, LoadError>;

pub fn load_file(path: &str) -> LoadResult<RawScore> {
  let bytes = fs::read(path).map_err(|err| LoadError::Read {
    path: path.to_string(),
    cause: err.to_string(),
  })?;
  parse(&bytes)
}

/// Merges every track into a single stream ordered by absolute tick.
/// Events at the same tick keep the track order, then the order within the track.
pub fn parse(bytes: &[u8]) -> LoadResult<RawScore> {
  let smf = Smf::parse(bytes).map_err(|err| LoadError::Parse {
    cause: err.to_string(),
  })?;

  let resolution = match smf.header.timing {
    Timing::Metrical(ticks_per_beat) => ticks_per_beat.as_int(),
    Timing::Timecode(fps, subframe) => {
      return Err(LoadError::UnsupportedTiming {
        timing: format!("{:?} fps with {} subframes", fps, subframe),
      })
    }
  };

  let mut events = Vec::new();
  for (track, track_events) in smf.tracks.iter().enumerate() {
    let mut tick = 0u64;
    for event in track_events.iter() {
      tick += u64::from(event.delta.as_int());
      if let Some(kind) = convert(&event.kind) {
        events.push(RawEvent::new(TicksTime::new(tick), track, kind));
      }
    }
  }
  events.sort_by_key(|event| event.tick);

  debug!(
    "Loaded {} events from {} tracks at {} ticks per quarter",
    events.len(),
    smf.tracks.len(),
    resolution
  );

  Ok(RawScore::new(resolution, events))
}

fn convert(kind: &TrackEventKind) -> Option<RawEventKind> {
  match *kind {
    TrackEventKind::Midi { channel, message } => Some(RawEventKind::Channel(convert_message(
      channel.as_int(),
      message,
    ))),
    TrackEventKind::SysEx(data) | TrackEventKind::Escape(data) => Some(RawEventKind::SysEx(data.to_vec())),
    TrackEventKind::Meta(ref meta) => convert_meta(meta).map(|(kind, data)| RawEventKind::Meta { kind, data }),
  }
}

fn convert_message(channel: u8, message: MidiMessage) -> Message {
  match message {
    MidiMessage::NoteOff { key, vel } => Message::NoteOff {
      channel,
      key: key.as_int(),
      velocity: vel.as_int(),
    },
    MidiMessage::NoteOn { key, vel } => Message::NoteOn {
      channel,
      key: key.as_int(),
      velocity: vel.as_int(),
    },
    MidiMessage::Aftertouch { key, vel } => Message::PolyphonicKeyPressure {
      channel,
      key: key.as_int(),
      value: vel.as_int(),
    },
    MidiMessage::Controller { controller, value } => Message::ControlChange {
      channel,
      controller: controller.as_int(),
      value: value.as_int(),
    },
    MidiMessage::ProgramChange { program } => Message::ProgramChange {
      channel,
      value: program.as_int(),
    },
    MidiMessage::ChannelAftertouch { vel } => Message::ChannelPressure {
      channel,
      value: vel.as_int(),
    },
    MidiMessage::PitchBend { bend } => Message::PitchBend {
      channel,
      value: bend.0.as_int(),
    },
  }
}

/// Type byte and data of the meta events the score may care about.
fn convert_meta(meta: &MetaMessage) -> Option<(u8, Vec<u8>)> {
  match *meta {
    MetaMessage::Text(data) => Some((META_TEXT, data.to_vec())),
    MetaMessage::Copyright(data) => Some((META_COPYRIGHT, data.to_vec())),
    MetaMessage::TrackName(data) => Some((META_TRACK_NAME, data.to_vec())),
    MetaMessage::InstrumentName(data) => Some((META_INSTRUMENT_NAME, data.to_vec())),
    MetaMessage::Lyric(data) => Some((META_LYRIC, data.to_vec())),
    MetaMessage::Marker(data) => Some((META_MARKER, data.to_vec())),
    MetaMessage::CuePoint(data) => Some((META_CUE_POINT, data.to_vec())),
    MetaMessage::EndOfTrack => Some((META_END_OF_TRACK, Vec::new())),
    MetaMessage::Tempo(usec) => {
      let usec = usec.as_int();
      Some((META_TEMPO, vec![(usec >> 16) as u8, (usec >> 8) as u8, usec as u8]))
    }
    // midly keeps the first four bytes of an oversized payload, so only short ones reach the
    // size check, as `Unknown`.
    MetaMessage::TimeSignature(numerator, denominator, clocks, thirty_seconds) => Some((
      META_TIME_SIGNATURE,
      vec![numerator, denominator, clocks, thirty_seconds],
    )),
    MetaMessage::KeySignature(sharps_flats, minor) => {
      Some((META_KEY_SIGNATURE, vec![sharps_flats as u8, minor as u8]))
    }
    MetaMessage::SequencerSpecific(data) => Some((META_SEQUENCER_SPECIFIC, data.to_vec())),
    MetaMessage::Unknown(kind, data) => Some((kind, data.to_vec())),
    _ => None,
  }
}

#[cfg(test)]
mod test {

  use super::{parse, LoadError};
  use organ_play_core::midi::Message;
  use organ_play_core::score::event::{META_END_OF_TRACK, META_MARKER, META_TEMPO, META_TIME_SIGNATURE};
  use organ_play_core::score::{DataError, EventPreProcessor, RawEvent, RawEventKind};

  fn header(tracks: u16, division: u16) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 6, 0, 1]);
    bytes.extend_from_slice(&tracks.to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    bytes
  }

  fn track(events: &[u8]) -> Vec<u8> {
    let mut bytes = b"MTrk".to_vec();
    bytes.extend_from_slice(&(events.len() as u32).to_be_bytes());
    bytes.extend_from_slice(events);
    bytes
  }

  fn smf(division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = header(tracks.len() as u16, division);
    for events in tracks {
      bytes.extend(track(events));
    }
    bytes
  }

  #[test]
  pub fn tracks_are_merged_by_tick() {
    let conductor: &[u8] = &[
      0x00, 0xff, 0x51, 0x03, 0x07, 0xa1, 0x20, // tempo 500000
      0x00, 0xff, 0x58, 0x04, 0x03, 0x02, 0x18, 0x08, // 3/4
      0x83, 0x60, 0xff, 0x06, 0x01, b'[', // marker at 480
      0x00, 0xff, 0x2f, 0x00,
    ];
    let notes: &[u8] = &[
      0x00, 0x90, 0x3c, 0x64, // note on at 0
      0x83, 0x60, 0x3c, 0x00, // running status, released at 480
      0x00, 0xff, 0x2f, 0x00,
    ];
    let score = parse(&smf(480, &[conductor, notes])).unwrap();
    assert_eq!(score.resolution, 480);

    let ticks: Vec<u64> = score.events.iter().map(|event| u64::from(event.tick)).collect();
    assert_eq!(ticks, vec![0, 0, 0, 480, 480, 480, 480]);

    assert_eq!(
      score.events[0],
      RawEvent::meta(0, 0, META_TEMPO, &[0x07, 0xa1, 0x20])
    );
    assert_eq!(
      score.events[1],
      RawEvent::meta(0, 0, META_TIME_SIGNATURE, &[3, 2, 0x18, 8])
    );
    assert_eq!(
      score.events[2],
      RawEvent::channel(
        0,
        1,
        Message::NoteOn {
          channel: 0,
          key: 60,
          velocity: 100
        }
      )
    );
    assert_eq!(score.events[3], RawEvent::meta(480, 0, META_MARKER, b"["));
    assert_eq!(score.events[4], RawEvent::end_of_track(480, 0));
    assert_eq!(
      score.events[5],
      RawEvent::channel(
        480,
        1,
        Message::NoteOn {
          channel: 0,
          key: 60,
          velocity: 0
        }
      )
    );
    assert_eq!(score.events[6].kind, RawEventKind::Meta {
      kind: META_END_OF_TRACK,
      data: vec![]
    });
  }

  #[test]
  pub fn legacy_meta_types_survive() {
    let events: &[u8] = &[0x00, 0xff, 0x10, 0x01, 0x03, 0x00, 0xff, 0x2f, 0x00];
    let score = parse(&smf(96, &[events])).unwrap();
    assert_eq!(score.events[0], RawEvent::meta(0, 0, 0x10, &[3]));
  }

  #[test]
  pub fn short_time_signature_keeps_its_size() {
    let events: &[u8] = &[0x00, 0xff, 0x58, 0x02, 0x04, 0x02, 0x00, 0xff, 0x2f, 0x00];
    let score = parse(&smf(96, &[events])).unwrap();
    assert_eq!(score.events[0], RawEvent::meta(0, 0, META_TIME_SIGNATURE, &[4, 2]));

    match EventPreProcessor::new().process(score) {
      Err(DataError::TimeSignatureSize { size, .. }) => assert_eq!(size, 4),
      other => panic!("unexpected result {:?}", other.map(|score| score.end())),
    }
  }

  #[test]
  pub fn controllers_and_sysex() {
    let events: &[u8] = &[
      0x00, 0xb1, 0x63, 0x05, // NRPN MSB on channel 1
      0x00, 0xf0, 0x03, 0x7e, 0x01, 0xf7, // sysex
      0x00, 0xff, 0x2f, 0x00,
    ];
    let score = parse(&smf(96, &[events])).unwrap();
    assert_eq!(
      score.events[0].kind,
      RawEventKind::Channel(Message::ControlChange {
        channel: 1,
        controller: 99,
        value: 5
      })
    );
    match score.events[1].kind {
      RawEventKind::SysEx(_) => {}
      ref other => panic!("expected sysex, got {:?}", other),
    }
  }

  #[test]
  pub fn timecode_is_rejected() {
    let events: &[u8] = &[0x00, 0xff, 0x2f, 0x00];
    match parse(&smf(0xe728, &[events])) {
      Err(LoadError::UnsupportedTiming { .. }) => {}
      other => panic!("unexpected result {:?}", other.map(|score| score.resolution)),
    }
  }

  #[test]
  pub fn garbage_is_a_parse_error() {
    match parse(b"not a midi file") {
      Err(LoadError::Parse { .. }) => {}
      other => panic!("unexpected result {:?}", other.map(|score| score.resolution)),
    }
  }
}
