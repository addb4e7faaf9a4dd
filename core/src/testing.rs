use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::midi::types::U7;
use crate::midi::{DeviceError, DeviceResult, Message, NoteSpace, OutputDevice};
use crate::playback::Timer;
use crate::score::event::{RawEvent, RawScore, META_MARKER};
use crate::time::{ClockTime, Resolution};

pub const RESOLUTION: Resolution = 480;

pub fn note_on(tick: u64, track: usize, key: U7) -> RawEvent {
  RawEvent::channel(
    tick,
    track,
    Message::NoteOn {
      channel: 0,
      key,
      velocity: 100,
    },
  )
}

pub fn note_off(tick: u64, track: usize, key: U7) -> RawEvent {
  RawEvent::channel(tick, track, Message::note_off(0, key))
}

pub fn marker(tick: u64, track: usize, text: &str) -> RawEvent {
  RawEvent::meta(tick, track, META_MARKER, text.as_bytes())
}

pub struct ScoreBuilder {
  resolution: Resolution,
  events: Vec<RawEvent>,
}

impl ScoreBuilder {
  pub fn new() -> ScoreBuilder {
    ScoreBuilder {
      resolution: RESOLUTION,
      events: Vec::new(),
    }
  }

  pub fn event(mut self, event: RawEvent) -> Self {
    self.events.push(event);
    self
  }

  pub fn meta(self, tick: u64, kind: u8, data: &[u8]) -> Self {
    self.event(RawEvent::meta(tick, 0, kind, data))
  }

  pub fn build(self) -> RawScore {
    RawScore::new(self.resolution, self.events)
  }
}

/// Records everything it is asked to send.
#[derive(Default)]
pub struct RecordingDevice {
  sent: Mutex<Vec<Message>>,
  all_notes_off: AtomicUsize,
  released: AtomicUsize,
  fail_after: Option<usize>,
}

impl RecordingDevice {
  pub fn new() -> RecordingDevice {
    RecordingDevice::default()
  }

  /// Fails every send once this many messages were sent.
  pub fn failing_after(count: usize) -> RecordingDevice {
    RecordingDevice {
      fail_after: Some(count),
      ..RecordingDevice::default()
    }
  }

  pub fn sent(&self) -> Vec<Message> {
    self.sent.lock().unwrap().clone()
  }

  /// Keys of the sounding note-ons, in the order they were sent.
  pub fn keys_on(&self) -> Vec<U7> {
    self
      .sent()
      .iter()
      .filter_map(|message| message.sounding_note().map(|(_, key)| key))
      .collect()
  }

  pub fn all_notes_off_calls(&self) -> usize {
    self.all_notes_off.load(Ordering::SeqCst)
  }

  /// Channel and note pairs covered by all the all-notes-off calls.
  pub fn released_by_all_notes_off(&self) -> usize {
    self.released.load(Ordering::SeqCst)
  }
}

impl OutputDevice for RecordingDevice {
  fn name(&self) -> &str {
    "recording"
  }

  fn send(&self, message: &Message) -> DeviceResult<()> {
    let mut sent = self.sent.lock().unwrap();
    if self.fail_after.map_or(false, |count| sent.len() >= count) {
      return Err(DeviceError::Send {
        device: self.name().to_string(),
        cause: "disconnected".to_string(),
      });
    }
    sent.push(*message);
    Ok(())
  }

  fn all_notes_off(&self, space: &NoteSpace) -> DeviceResult<()> {
    self.all_notes_off.fetch_add(1, Ordering::SeqCst);
    self.released.fetch_add(space.note_offs().count(), Ordering::SeqCst);
    Ok(())
  }
}

/// Records the waits instead of sleeping.
#[derive(Clone, Default)]
pub struct ManualTimer {
  waits: Arc<Mutex<Vec<ClockTime>>>,
}

impl ManualTimer {
  pub fn new() -> ManualTimer {
    ManualTimer::default()
  }

  pub fn waits(&self) -> Vec<u64> {
    self.waits.lock().unwrap().iter().map(|wait| wait.micros()).collect()
  }
}

impl Timer for ManualTimer {
  fn sleep(&mut self, duration: ClockTime) {
    self.waits.lock().unwrap().push(duration);
  }
}
