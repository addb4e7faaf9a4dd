use crate::time::ClockTime;

/// The real-time wait between two events.
pub trait Timer: Send {
  fn sleep(&mut self, duration: ClockTime);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTimer;

impl Timer for ThreadTimer {
  fn sleep(&mut self, duration: ClockTime) {
    if duration > ClockTime::zero() {
      std::thread::sleep(duration.to_duration());
    }
  }
}
