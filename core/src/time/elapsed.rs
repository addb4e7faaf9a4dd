use std::time::Instant;

use crate::time::ClockTime;

/// Wall clock stopwatch for a playback session.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedTimer {
  started: Option<Instant>,
}

impl ElapsedTimer {
  pub fn new() -> ElapsedTimer {
    ElapsedTimer { started: None }
  }

  pub fn start(&mut self) {
    self.started = Some(Instant::now());
  }

  pub fn is_started(&self) -> bool {
    self.started.is_some()
  }

  pub fn elapsed(&self) -> ClockTime {
    self
      .started
      .map(|started| ClockTime::from(started.elapsed()))
      .unwrap_or_else(ClockTime::zero)
  }
}

impl Default for ElapsedTimer {
  fn default() -> ElapsedTimer {
    ElapsedTimer::new()
  }
}
