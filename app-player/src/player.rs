use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use failure::Fail;

use log::info;

use organ_play_core::playback::{PlaybackOrchestrator, PlaybackResult, Report};
use organ_play_core::time::ClockTime;

#[derive(Debug, Fail)]
pub enum PlayerError {
  #[fail(display = "Failed to create the playback thread: {}", cause)]
  Start { cause: String },

  #[fail(display = "Failed to join the playback thread")]
  Stop,
}

/// A playback session running on its own thread.
pub struct Player {
  handler: JoinHandle<PlaybackResult<ClockTime>>,
  reports_rx: Receiver<Report>,
}

impl Player {
  pub fn spawn(orchestrator: PlaybackOrchestrator) -> Result<Player, PlayerError> {
    info!("Spawning playback thread ...");

    let (reports_tx, reports_rx) = crossbeam_channel::unbounded::<Report>();
    let mut orchestrator = orchestrator.with_reports(reports_tx);

    thread::Builder::new()
      .name("playback".into())
      .spawn(move || orchestrator.play())
      .map_err(|err| PlayerError::Start {
        cause: err.to_string(),
      })
      .map(|handler| Player { handler, reports_rx })
  }

  /// Progress of the session. The channel disconnects when the session ends.
  pub fn reports(&self) -> &Receiver<Report> {
    &self.reports_rx
  }

  pub fn join(self) -> Result<PlaybackResult<ClockTime>, PlayerError> {
    self.handler.join().map_err(|_| PlayerError::Stop)
  }
}
