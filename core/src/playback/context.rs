use std::collections::BTreeSet;

use crate::config::Config;
use crate::midi::types::{U4, U7};
use crate::midi::Message;
use crate::score::Score;
use crate::time::{ElapsedTimer, Tempo, TicksTime};

use super::director::MusicalDirector;
use super::ritardando::RitardandoEffector;
use super::state::PlaybackStateMachine;

/// Everything that changes during one playback session. Built fresh for every session.
#[derive(Debug)]
pub struct PlaybackContext {
  pub state: PlaybackStateMachine,
  pub director: MusicalDirector,
  pub ritardando: RitardandoEffector,
  /// Index of the next event to play.
  pub position: usize,
  pub tick: TicksTime,
  pub tempo: Tempo,
  pub elapsed: ElapsedTimer,
  sounding: BTreeSet<(U4, U7)>,
}

impl PlaybackContext {
  pub fn new(score: &Score, config: &Config, verses: u32) -> PlaybackContext {
    let metadata = score.metadata();
    PlaybackContext {
      state: PlaybackStateMachine::new(),
      director: MusicalDirector::new(
        verses,
        metadata.intro_segments().to_vec(),
        config.playback.intro_repeats,
      ),
      ritardando: RitardandoEffector::new(&config.ritardando, score.resolution()),
      position: 0,
      tick: TicksTime::zero(),
      tempo: Tempo::default(),
      elapsed: ElapsedTimer::new(),
      sounding: BTreeSet::new(),
    }
  }

  /// Moves the cursor, picking up the tempo in effect there.
  pub fn seek(&mut self, score: &Score, tick: TicksTime) {
    self.position = score.position_of(tick);
    self.tick = tick;
    self.tempo = score.tempo_at(tick);
  }

  pub fn track(&mut self, message: &Message) {
    if let Some(note) = message.sounding_note() {
      self.sounding.insert(note);
    } else if let Some(note) = message.released_note() {
      self.sounding.remove(&note);
    }
  }

  pub fn sounding_notes(&self) -> usize {
    self.sounding.len()
  }

  /// Note-offs for every note still sounding, forgetting them.
  pub fn take_note_offs(&mut self) -> Vec<Message> {
    let notes = std::mem::replace(&mut self.sounding, BTreeSet::new());
    notes
      .into_iter()
      .map(|(channel, key)| Message::note_off(channel, key))
      .collect()
  }
}
