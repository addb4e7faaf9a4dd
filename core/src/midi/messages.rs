use super::types::{U14, U4, U7};

/// Channel voice messages, the only kind the player sends to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
  NoteOff {
    channel: U4,
    key: U7,
    velocity: U7,
  },
  NoteOn {
    channel: U4,
    key: U7,
    velocity: U7,
  },
  PolyphonicKeyPressure {
    channel: U4,
    key: U7,
    value: U7,
  },
  ControlChange {
    channel: U4,
    controller: U7,
    value: U7,
  },
  ProgramChange {
    channel: U4,
    value: U7,
  },
  ChannelPressure {
    channel: U4,
    value: U7,
  },
  PitchBend {
    channel: U4,
    value: U14,
  },
}

impl Message {
  pub fn channel(&self) -> U4 {
    match *self {
      Message::NoteOff { channel, .. }
      | Message::NoteOn { channel, .. }
      | Message::PolyphonicKeyPressure { channel, .. }
      | Message::ControlChange { channel, .. }
      | Message::ProgramChange { channel, .. }
      | Message::ChannelPressure { channel, .. }
      | Message::PitchBend { channel, .. } => channel,
    }
  }

  /// A note-on with a non-zero velocity.
  pub fn sounding_note(&self) -> Option<(U4, U7)> {
    match *self {
      Message::NoteOn {
        channel,
        key,
        velocity,
      } if velocity > 0 => Some((channel, key)),
      _ => None,
    }
  }

  /// A note-off, or a note-on with zero velocity.
  pub fn released_note(&self) -> Option<(U4, U7)> {
    match *self {
      Message::NoteOff { channel, key, .. } => Some((channel, key)),
      Message::NoteOn {
        channel,
        key,
        velocity: 0,
      } => Some((channel, key)),
      _ => None,
    }
  }

  pub fn note_off(channel: U4, key: U7) -> Message {
    Message::NoteOff {
      channel,
      key,
      velocity: 0,
    }
  }
}
