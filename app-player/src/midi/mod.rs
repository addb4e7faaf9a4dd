mod log_output;

#[cfg(feature = "portmidi")]
mod portmidi;

pub const DEFAULT_ID: &str = log_output::ID;

use std::collections::HashMap;
use std::sync::Arc;

use failure::Fail;

use organ_play_core::midi::OutputDevice;

#[derive(Debug, Fail)]
pub enum MidiError {
  #[fail(display = "Failed to initialise the MIDI driver: {}", cause)]
  Init { cause: String },

  #[fail(display = "Driver not found: {}", id)]
  DriverNotFound { id: String },

  #[fail(display = "Destination not found: {}", name)]
  DestinationNotFound { name: String },

  #[fail(display = "Failed to open a destination: {}", cause)]
  DestinationOpen { cause: String },
}

pub type MidiResult<T> = Result<T, MidiError>;

type MidiDriverFactory = Box<dyn Fn(String) -> MidiResult<Box<dyn MidiDriver>>>;

pub struct MidiDrivers {
  drivers: HashMap<String, MidiDriverFactory>,
}

impl MidiDrivers {
  pub fn new() -> MidiDrivers {
    let mut drivers: HashMap<String, MidiDriverFactory> = HashMap::new();

    Self::add_native_drivers(&mut drivers);

    Self::add_common_drivers(&mut drivers);

    MidiDrivers { drivers }
  }

  #[cfg(feature = "portmidi")]
  fn add_native_drivers(drivers: &mut HashMap<String, MidiDriverFactory>) {
    let portmidi_factory = Box::new(|_app_name: String| {
      portmidi::PortMidiDriver::new().map(|driver| Box::new(driver) as Box<dyn MidiDriver>)
    });
    drivers.insert(portmidi::ID.to_string(), portmidi_factory);
  }

  #[cfg(not(feature = "portmidi"))]
  fn add_native_drivers(_drivers: &mut HashMap<String, MidiDriverFactory>) {}

  fn add_common_drivers(drivers: &mut HashMap<String, MidiDriverFactory>) {
    let log_factory = Box::new(|app_name: String| {
      Ok(Box::new(log_output::LogDriver::new(app_name)) as Box<dyn MidiDriver>)
    });
    drivers.insert(log_output::ID.to_string(), log_factory);
  }

  pub fn drivers(&self) -> Vec<&String> {
    let mut ids: Vec<&String> = self.drivers.keys().collect();
    ids.sort();
    ids
  }

  pub fn driver<A, B>(&self, id: A, app_name: B) -> MidiResult<Box<dyn MidiDriver>>
  where
    A: Into<String>,
    B: Into<String>,
  {
    let id = id.into();
    self
      .drivers
      .get(&id)
      .map(|driver_factory| driver_factory(app_name.into()))
      .unwrap_or_else(|| Err(MidiError::DriverNotFound { id }))
  }
}

pub trait MidiDriver {
  fn id(&self) -> &str;

  fn destinations(&self) -> Vec<Box<dyn MidiDestination>>;

  /// Opens the destination with that name, or the first one.
  fn open(&self, name: Option<&str>) -> MidiResult<Arc<dyn OutputDevice>> {
    let destinations = self.destinations();
    let destination = match name {
      Some(name) => destinations
        .iter()
        .find(|destination| destination.name() == name)
        .ok_or_else(|| MidiError::DestinationNotFound {
          name: name.to_string(),
        })?,
      None => destinations
        .first()
        .ok_or_else(|| MidiError::DestinationNotFound {
          name: "<any>".to_string(),
        })?,
    };
    destination.open()
  }
}

pub trait MidiEndpoint {
  fn name(&self) -> &str;
}

pub trait MidiDestination: MidiEndpoint {
  fn open(&self) -> MidiResult<Arc<dyn OutputDevice>>;
}
