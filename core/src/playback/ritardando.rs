use log::debug;

use crate::config::Ritardando as RitardandoConfig;
use crate::time::{Resolution, TicksTime};

/// Slows the tempo down gradually once a ritardando marker is reached.
///
/// The multiplier goes linearly from 1.0 to the configured floor over the span,
/// and is only recomputed on heartbeats, every `heartbeat_events` processed events.
#[derive(Debug)]
pub struct RitardandoEffector {
  floor: f64,
  span: TicksTime,
  heartbeat_events: u32,
  start: Option<TicksTime>,
  progress: TicksTime,
  multiplier: f64,
  complete: bool,
  events_since_heartbeat: u32,
}

impl RitardandoEffector {
  pub fn new(config: &RitardandoConfig, resolution: Resolution) -> RitardandoEffector {
    RitardandoEffector {
      floor: config.floor(),
      span: TicksTime::from_beats(config.span_beats, resolution),
      heartbeat_events: config.heartbeat_events(),
      start: None,
      progress: TicksTime::zero(),
      multiplier: 1.0,
      complete: false,
      events_since_heartbeat: 0,
    }
  }

  pub fn is_active(&self) -> bool {
    self.start.is_some()
  }

  pub fn is_complete(&self) -> bool {
    self.complete
  }

  pub fn multiplier(&self) -> f64 {
    self.multiplier
  }

  /// Starts slowing down from the tick of the marker. Ignored while already running.
  pub fn trigger(&mut self, tick: TicksTime) -> bool {
    if self.start.is_some() {
      return false;
    }
    debug!("Ritardando from tick {} over {} ticks", tick, self.span);
    self.start = Some(tick);
    self.progress = TicksTime::zero();
    self.events_since_heartbeat = 0;
    if self.span.is_zero() {
      self.pin_to_floor();
    }
    true
  }

  /// Counts a processed event, and recomputes the multiplier when a heartbeat is due.
  /// Returns whether the multiplier was recomputed.
  pub fn on_event(&mut self, tick: TicksTime) -> bool {
    let start = match self.start {
      Some(start) if !self.complete => start,
      _ => return false,
    };

    self.events_since_heartbeat += 1;
    if self.events_since_heartbeat < self.heartbeat_events {
      return false;
    }
    self.events_since_heartbeat = 0;

    self.progress = self.progress.max(tick - start);
    if self.progress >= self.span {
      self.pin_to_floor();
    } else {
      let fraction = f64::from(self.progress) / f64::from(self.span);
      self.multiplier = 1.0 - (1.0 - self.floor) * fraction;
    }
    true
  }

  fn pin_to_floor(&mut self) {
    self.multiplier = self.floor;
    self.complete = true;
  }

  /// Back to normal tempo, for a new pass over the score.
  pub fn reset(&mut self) {
    self.start = None;
    self.progress = TicksTime::zero();
    self.multiplier = 1.0;
    self.complete = false;
    self.events_since_heartbeat = 0;
  }
}
