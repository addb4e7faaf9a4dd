use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::debug;

use organ_play_core::midi::{DeviceResult, Encoder, Message, NoteSpace, OutputDevice};

use super::{MidiDestination, MidiDriver, MidiEndpoint, MidiResult};

pub const ID: &str = "log";

/// A dry run driver: messages are encoded and logged instead of played.
pub struct LogDriver {
  name: String,
}

impl LogDriver {
  pub fn new(name: String) -> LogDriver {
    LogDriver { name }
  }
}

impl MidiDriver for LogDriver {
  fn id(&self) -> &str {
    ID
  }

  fn destinations(&self) -> Vec<Box<dyn MidiDestination>> {
    vec![Box::new(LogDestination {
      name: self.name.clone(),
    })]
  }
}

struct LogDestination {
  name: String,
}

impl MidiEndpoint for LogDestination {
  fn name(&self) -> &str {
    self.name.as_str()
  }
}

impl MidiDestination for LogDestination {
  fn open(&self) -> MidiResult<Arc<dyn OutputDevice>> {
    Ok(Arc::new(LogOutput::new(self.name.clone())))
  }
}

pub struct LogOutput {
  name: String,
  sent: AtomicUsize,
  released: AtomicUsize,
}

impl LogOutput {
  pub fn new(name: String) -> LogOutput {
    LogOutput {
      name,
      sent: AtomicUsize::new(0),
      released: AtomicUsize::new(0),
    }
  }

  pub fn sent(&self) -> usize {
    self.sent.load(Ordering::SeqCst)
  }

  pub fn released(&self) -> usize {
    self.released.load(Ordering::SeqCst)
  }
}

impl OutputDevice for LogOutput {
  fn name(&self) -> &str {
    self.name.as_str()
  }

  fn send(&self, message: &Message) -> DeviceResult<()> {
    let (data, size) = Encoder::to_bytes(message);
    debug!("[{}] {:02x?}", self.name, &data[..size]);
    self.sent.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  // Called from the signal handler: counting only, the logger may be locked.
  fn all_notes_off(&self, space: &NoteSpace) -> DeviceResult<()> {
    self.released.fetch_add(space.len(), Ordering::SeqCst);
    Ok(())
  }
}
