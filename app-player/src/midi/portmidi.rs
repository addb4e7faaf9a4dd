use std::sync::{Arc, Mutex};

use log::{debug, warn};

use portmidi::{DeviceInfo, MidiMessage, OutputPort, PortMidi};

use organ_play_core::midi::{DeviceError, DeviceResult, Encoder, Message, NoteSpace, OutputDevice};

use super::{MidiDestination, MidiDriver, MidiEndpoint, MidiError, MidiResult};

pub const ID: &str = "portmidi";

const MIDI_BUF_LEN: usize = 8 * 1024;

pub struct PortMidiDriver {
  context: Arc<PortMidi>,
}

impl PortMidiDriver {
  pub fn new() -> MidiResult<PortMidiDriver> {
    PortMidi::new()
      .map_err(|err| MidiError::Init {
        cause: format!("{:?}", err),
      })
      .map(|context| PortMidiDriver {
        context: Arc::new(context),
      })
  }
}

impl MidiDriver for PortMidiDriver {
  fn id(&self) -> &str {
    ID
  }

  fn destinations(&self) -> Vec<Box<dyn MidiDestination>> {
    self
      .context
      .devices()
      .into_iter()
      .flat_map(|devices| {
        devices
          .into_iter()
          .filter(DeviceInfo::is_output)
          .map(|device| {
            Box::new(PortMidiDestination {
              name: device.name().clone(),
              context: Arc::clone(&self.context),
              device,
            }) as Box<dyn MidiDestination>
          })
          .collect::<Vec<Box<dyn MidiDestination>>>()
      })
      .collect()
  }
}

pub struct PortMidiDestination {
  name: String,
  context: Arc<PortMidi>,
  device: DeviceInfo,
}

impl PortMidiDestination {
  fn open_port(&self) -> MidiResult<OutputPort> {
    self
      .context
      .output_port(self.device.clone(), MIDI_BUF_LEN)
      .map_err(|err| MidiError::DestinationOpen {
        cause: format!("Device={:?}, Error={:?}", self.name, err),
      })
  }
}

impl MidiEndpoint for PortMidiDestination {
  fn name(&self) -> &str {
    self.name.as_str()
  }
}

impl MidiDestination for PortMidiDestination {
  fn open(&self) -> MidiResult<Arc<dyn OutputDevice>> {
    let port = self.open_port()?;
    let emergency = match self.open_port() {
      Ok(port) => Some(port),
      Err(err) => {
        warn!("No separate emergency port for {}: {}", self.name, err);
        None
      }
    };
    debug!("Opened {}", self.name);
    Ok(Arc::new(PortMidiOutput {
      name: self.name.clone(),
      _context: Arc::clone(&self.context),
      port: Mutex::new(port),
      emergency: emergency.map(Mutex::new),
    }))
  }
}

struct PortMidiOutput {
  name: String,
  _context: Arc<PortMidi>,
  port: Mutex<OutputPort>,
  emergency: Option<Mutex<OutputPort>>,
}

// Ports are only written through their mutex.
unsafe impl Send for PortMidiOutput {}
unsafe impl Sync for PortMidiOutput {}

impl PortMidiOutput {
  fn write(&self, port: &mut OutputPort, msg: &Message) -> DeviceResult<()> {
    let (data, size) = Encoder::to_bytes(msg);
    let message = match size {
      1 => MidiMessage {
        status: data[0],
        data1: 0,
        data2: 0,
      },
      2 => MidiMessage {
        status: data[0],
        data1: data[1],
        data2: 0,
      },
      _ => MidiMessage {
        status: data[0],
        data1: data[1],
        data2: data[2],
      },
    };
    port.write_message(message).map_err(|err| DeviceError::Send {
      device: self.name.clone(),
      cause: format!("{:?}", err),
    })
  }

  fn unreachable(&self, cause: &str) -> DeviceError {
    DeviceError::Unreachable {
      device: self.name.clone(),
      cause: cause.to_string(),
    }
  }
}

impl OutputDevice for PortMidiOutput {
  fn name(&self) -> &str {
    self.name.as_str()
  }

  fn send(&self, message: &Message) -> DeviceResult<()> {
    let mut port = self.port.lock().map_err(|_| self.unreachable("poisoned port"))?;
    self.write(&mut port, message)
  }

  // Never blocks: the playback thread may be holding the main port.
  fn all_notes_off(&self, space: &NoteSpace) -> DeviceResult<()> {
    let mut port = self
      .emergency
      .as_ref()
      .and_then(|emergency| emergency.try_lock().ok())
      .or_else(|| self.port.try_lock().ok())
      .ok_or_else(|| self.unreachable("every port is busy"))?;

    let mut result = Ok(());
    for message in space.note_offs() {
      if let Err(err) = self.write(&mut port, &message) {
        result = Err(err);
      }
    }
    result
  }
}
