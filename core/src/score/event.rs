use crate::midi::Message;
use crate::time::{Resolution, Tempo, TicksTime};

use super::markers::Marker;

pub const META_TRACK_NAME: u8 = 0x03;
pub const META_LYRIC: u8 = 0x05;
pub const META_MARKER: u8 = 0x06;
pub const META_END_OF_TRACK: u8 = 0x2f;
pub const META_TEMPO: u8 = 0x51;
pub const META_TIME_SIGNATURE: u8 = 0x58;
pub const META_KEY_SIGNATURE: u8 = 0x59;
pub const META_SEQUENCER_SPECIFIC: u8 = 0x7f;

/// What a score source hands over for every track event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEventKind {
  Channel(Message),
  SysEx(Vec<u8>),
  Meta { kind: u8, data: Vec<u8> },
}

/// An event of the merged score stream, at an absolute tick.
/// `track` is the index of the track the event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
  pub tick: TicksTime,
  pub track: usize,
  pub kind: RawEventKind,
}

impl RawEvent {
  pub fn new(tick: TicksTime, track: usize, kind: RawEventKind) -> RawEvent {
    RawEvent { tick, track, kind }
  }

  pub fn channel(tick: u64, track: usize, message: Message) -> RawEvent {
    RawEvent::new(TicksTime::new(tick), track, RawEventKind::Channel(message))
  }

  pub fn meta(tick: u64, track: usize, kind: u8, data: &[u8]) -> RawEvent {
    RawEvent::new(
      TicksTime::new(tick),
      track,
      RawEventKind::Meta {
        kind,
        data: data.to_vec(),
      },
    )
  }

  pub fn end_of_track(tick: u64, track: usize) -> RawEvent {
    RawEvent::meta(tick, track, META_END_OF_TRACK, &[])
  }
}

/// The demultiplexed content of a score file: every track merged by tick.
#[derive(Debug, Clone)]
pub struct RawScore {
  pub resolution: Resolution,
  pub events: Vec<RawEvent>,
}

impl RawScore {
  pub fn new(resolution: Resolution, events: Vec<RawEvent>) -> RawScore {
    RawScore { resolution, events }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
  Channel(Message),
  Tempo(Tempo),
  Marker(Marker),
}

/// An annotated score event, ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
  pub tick: TicksTime,
  pub payload: Payload,
}

impl Event {
  pub fn new(tick: TicksTime, payload: Payload) -> Event {
    Event { tick, payload }
  }
}
