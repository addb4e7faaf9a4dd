pub mod context;
pub mod director;
pub mod orchestrator;
pub mod report;
pub mod ritardando;
pub mod state;
pub mod timer;

pub use self::director::{Directive, MusicalDirector};
pub use self::orchestrator::PlaybackOrchestrator;
pub use self::report::Report;
pub use self::ritardando::RitardandoEffector;
pub use self::state::{PlaybackState, PlaybackStateMachine, StateError};
pub use self::timer::{ThreadTimer, Timer};

use failure::Fail;

use crate::midi::DeviceError;
use crate::time::TicksTime;

#[derive(Debug, Fail)]
pub enum PlaybackError {
  #[fail(display = "Playback state error: {}", cause)]
  State {
    #[cause]
    cause: StateError,
  },

  #[fail(display = "Output failed at tick {}: {}", tick, cause)]
  Device {
    tick: TicksTime,
    #[cause]
    cause: DeviceError,
  },
}

impl From<StateError> for PlaybackError {
  fn from(cause: StateError) -> Self {
    PlaybackError::State { cause }
  }
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
