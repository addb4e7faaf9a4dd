use std::ops::RangeInclusive;

use failure::Fail;

use super::messages::Message;
use super::types::{U4, U7, MAX_CHANNEL, MAX_NOTE};

#[derive(Debug, Fail)]
pub enum DeviceError {
  #[fail(display = "Failed to send a message to {}: {}", device, cause)]
  Send { device: String, cause: String },

  #[fail(display = "Device {} is unreachable: {}", device, cause)]
  Unreachable { device: String, cause: String },
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// The channel and note range a device can address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSpace {
  channels: RangeInclusive<U4>,
  notes: RangeInclusive<U7>,
}

impl NoteSpace {
  /// Ranges are clamped to what MIDI can address.
  pub fn new(channels: RangeInclusive<U4>, notes: RangeInclusive<U7>) -> NoteSpace {
    let channels = *channels.start().min(&MAX_CHANNEL)..=*channels.end().min(&MAX_CHANNEL);
    let notes = *notes.start().min(&MAX_NOTE)..=*notes.end().min(&MAX_NOTE);
    NoteSpace { channels, notes }
  }

  pub fn channels(&self) -> RangeInclusive<U4> {
    self.channels.clone()
  }

  pub fn notes(&self) -> RangeInclusive<U7> {
    self.notes.clone()
  }

  pub fn len(&self) -> usize {
    self.channels.clone().count() * self.notes.clone().count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// One note-off for every channel and note in the space, channel by channel.
  pub fn note_offs(&self) -> impl Iterator<Item = Message> {
    let notes = self.notes.clone();
    self
      .channels
      .clone()
      .flat_map(move |channel| notes.clone().map(move |key| Message::note_off(channel, key)))
  }
}

impl Default for NoteSpace {
  fn default() -> NoteSpace {
    NoteSpace::new(0..=MAX_CHANNEL, 0..=MAX_NOTE)
  }
}

/// A destination for the messages of a score.
///
/// `all_notes_off` is also called from the signal handler, while the playback
/// thread may be suspended anywhere, including inside `send`. Implementations
/// must not take a lock in it that `send` could be holding.
pub trait OutputDevice: Send + Sync {
  fn name(&self) -> &str;

  fn send(&self, message: &Message) -> DeviceResult<()>;

  fn all_notes_off(&self, space: &NoteSpace) -> DeviceResult<()>;
}
