use std::fmt;

use failure::Fail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
  Stopped,
  PlayingIntro,
  PlayingBody,
  Paused(Playing),
  Finished,
}

/// The playing states a pause returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playing {
  Intro,
  Body,
}

impl From<Playing> for PlaybackState {
  fn from(item: Playing) -> Self {
    match item {
      Playing::Intro => PlaybackState::PlayingIntro,
      Playing::Body => PlaybackState::PlayingBody,
    }
  }
}

impl fmt::Display for PlaybackState {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      PlaybackState::Stopped => write!(f, "stopped"),
      PlaybackState::PlayingIntro => write!(f, "playing intro"),
      PlaybackState::PlayingBody => write!(f, "playing body"),
      PlaybackState::Paused(Playing::Intro) => write!(f, "paused in intro"),
      PlaybackState::Paused(Playing::Body) => write!(f, "paused in body"),
      PlaybackState::Finished => write!(f, "finished"),
    }
  }
}

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum StateError {
  #[fail(display = "Cannot {} while {}", action, state)]
  IllegalTransition {
    state: PlaybackState,
    action: &'static str,
  },
}

pub type StateResult<T> = Result<T, StateError>;

/// Gates what the orchestrator may do. Ritardando is an overlay on the playing states.
#[derive(Debug)]
pub struct PlaybackStateMachine {
  state: PlaybackState,
  ritardando: bool,
}

impl PlaybackStateMachine {
  pub fn new() -> PlaybackStateMachine {
    PlaybackStateMachine {
      state: PlaybackState::Stopped,
      ritardando: false,
    }
  }

  pub fn state(&self) -> PlaybackState {
    self.state
  }

  pub fn is_ritardando(&self) -> bool {
    self.ritardando
  }

  pub fn is_playing(&self) -> bool {
    self.playing().is_some()
  }

  pub fn is_playing_intro(&self) -> bool {
    self.state == PlaybackState::PlayingIntro
  }

  fn playing(&self) -> Option<Playing> {
    match self.state {
      PlaybackState::PlayingIntro => Some(Playing::Intro),
      PlaybackState::PlayingBody => Some(Playing::Body),
      _ => None,
    }
  }

  fn illegal<T>(&self, action: &'static str) -> StateResult<T> {
    Err(StateError::IllegalTransition {
      state: self.state,
      action,
    })
  }

  pub fn start(&mut self, play_intro: bool) -> StateResult<()> {
    match self.state {
      PlaybackState::Stopped => {
        self.state = if play_intro {
          PlaybackState::PlayingIntro
        } else {
          PlaybackState::PlayingBody
        };
        self.ritardando = false;
        Ok(())
      }
      _ => self.illegal("start"),
    }
  }

  pub fn intro_complete(&mut self) -> StateResult<()> {
    match self.state {
      PlaybackState::PlayingIntro => {
        self.state = PlaybackState::PlayingBody;
        self.ritardando = false;
        Ok(())
      }
      _ => self.illegal("complete the introduction"),
    }
  }

  pub fn pause(&mut self) -> StateResult<()> {
    match self.playing() {
      Some(playing) => {
        self.state = PlaybackState::Paused(playing);
        Ok(())
      }
      None => self.illegal("pause"),
    }
  }

  pub fn resume(&mut self) -> StateResult<()> {
    match self.state {
      PlaybackState::Paused(playing) => {
        self.state = playing.into();
        Ok(())
      }
      _ => self.illegal("resume"),
    }
  }

  pub fn begin_ritardando(&mut self) -> StateResult<()> {
    if self.is_playing() {
      self.ritardando = true;
      Ok(())
    } else {
      self.illegal("begin a ritardando")
    }
  }

  pub fn end_ritardando(&mut self) {
    self.ritardando = false;
  }

  pub fn finish(&mut self) -> StateResult<()> {
    if self.is_playing() {
      self.state = PlaybackState::Finished;
      self.ritardando = false;
      Ok(())
    } else {
      self.illegal("finish")
    }
  }

  /// Back to the initial state, from anywhere.
  pub fn stop(&mut self) {
    self.state = PlaybackState::Stopped;
    self.ritardando = false;
  }
}

impl Default for PlaybackStateMachine {
  fn default() -> PlaybackStateMachine {
    PlaybackStateMachine::new()
  }
}
