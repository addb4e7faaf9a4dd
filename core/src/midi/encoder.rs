use super::messages::Message;
use super::types::{U14, U4, U7};

pub const MAX_MESSAGE_SIZE: usize = 3;

#[inline]
fn u7(d: U7) -> u8 {
  d & 0x7f
}

#[inline]
fn u14_msb(d: U14) -> u8 {
  ((d >> 7) & 0x7fu16) as u8
}

#[inline]
fn u14_lsb(d: U14) -> u8 {
  (d & 0x7f) as u8
}

#[inline]
fn status_and_channel(status: U4, channel: U4) -> u8 {
  (status << 4) | (channel & 0x0f)
}

pub struct Encoder;

impl Encoder {
  pub fn data_size(msg: &Message) -> usize {
    match msg {
      Message::NoteOff { .. } => 3,
      Message::NoteOn { .. } => 3,
      Message::PolyphonicKeyPressure { .. } => 3,
      Message::ControlChange { .. } => 3,
      Message::ProgramChange { .. } => 2,
      Message::ChannelPressure { .. } => 2,
      Message::PitchBend { .. } => 3,
    }
  }

  /// Writes the wire bytes and returns how many were written.
  pub fn encode(msg: &Message, out: &mut [u8; MAX_MESSAGE_SIZE]) -> usize {
    match *msg {
      Message::NoteOff {
        channel,
        key,
        velocity,
      } => out.copy_from_slice(&[status_and_channel(0b1000, channel), u7(key), u7(velocity)]),
      Message::NoteOn {
        channel,
        key,
        velocity,
      } => out.copy_from_slice(&[status_and_channel(0b1001, channel), u7(key), u7(velocity)]),
      Message::PolyphonicKeyPressure {
        channel,
        key,
        value,
      } => out.copy_from_slice(&[status_and_channel(0b1010, channel), u7(key), u7(value)]),
      Message::ControlChange {
        channel,
        controller,
        value,
      } => out.copy_from_slice(&[
        status_and_channel(0b1011, channel),
        u7(controller),
        u7(value),
      ]),
      Message::ProgramChange { channel, value } => {
        out[..2].copy_from_slice(&[status_and_channel(0b1100, channel), u7(value)])
      }
      Message::ChannelPressure { channel, value } => {
        out[..2].copy_from_slice(&[status_and_channel(0b1101, channel), u7(value)])
      }
      Message::PitchBend { channel, value } => out.copy_from_slice(&[
        status_and_channel(0b1110, channel),
        u14_lsb(value),
        u14_msb(value),
      ]),
    }
    Self::data_size(msg)
  }

  pub fn to_bytes(msg: &Message) -> ([u8; MAX_MESSAGE_SIZE], usize) {
    let mut out = [0u8; MAX_MESSAGE_SIZE];
    let size = Self::encode(msg, &mut out);
    (out, size)
  }
}
