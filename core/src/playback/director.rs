use log::debug;

use crate::score::{IntroductionSegment, Marker};
use crate::time::TicksTime;

/// What the orchestrator must do after a marker or the end of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
  Continue,
  JumpToStart,
  /// Resume the introduction at the given tick.
  RepeatIntro(TicksTime),
  Stop,
}

/// Verse, introduction and D.C. al Fine bookkeeping.
///
/// Verse indices are zero based. Only `verse_number` converts to what is displayed.
#[derive(Debug)]
pub struct MusicalDirector {
  verses: u32,
  verse_index: u32,
  intro_segments: Vec<IntroductionSegment>,
  intro_repeats: u32,
  repeats_done: u32,
  segment: usize,
  playing_intro: bool,
  al_fine: bool,
}

impl MusicalDirector {
  pub fn new(
    verses: u32,
    intro_segments: Vec<IntroductionSegment>,
    intro_repeats: u32,
  ) -> MusicalDirector {
    MusicalDirector {
      verses: verses.max(1),
      verse_index: 0,
      intro_segments,
      intro_repeats,
      repeats_done: 0,
      segment: 0,
      playing_intro: false,
      al_fine: false,
    }
  }

  /// Begins a session and returns the tick to start playing from.
  pub fn start(&mut self, play_intro: bool) -> TicksTime {
    self.verse_index = 0;
    self.repeats_done = 0;
    self.segment = 0;
    self.al_fine = false;
    self.playing_intro = play_intro && !self.intro_segments.is_empty();
    if self.playing_intro {
      self.intro_segments[0].start
    } else {
      TicksTime::zero()
    }
  }

  pub fn verses(&self) -> u32 {
    self.verses
  }

  pub fn verse_index(&self) -> u32 {
    self.verse_index
  }

  /// One based, for display.
  pub fn verse_number(&self) -> u32 {
    self.verse_index + 1
  }

  pub fn is_last_verse(&self) -> bool {
    self.verse_index + 1 >= self.verses
  }

  pub fn is_playing_intro(&self) -> bool {
    self.playing_intro
  }

  pub fn is_al_fine(&self) -> bool {
    self.al_fine
  }

  /// Ritardando is only played at the end of the introduction or of the last verse.
  pub fn allows_ritardando(&self) -> bool {
    self.playing_intro || self.is_last_verse()
  }

  pub fn resolve(&mut self, marker: &Marker) -> Directive {
    match marker {
      Marker::IntroEnd if self.playing_intro => self.intro_end(),
      Marker::DaCapoAlFine if !self.playing_intro && self.is_last_verse() && !self.al_fine => {
        debug!("D.C. al Fine on verse {}", self.verse_number());
        self.al_fine = true;
        Directive::JumpToStart
      }
      Marker::Fine if self.al_fine => Directive::Stop,
      _ => Directive::Continue,
    }
  }

  fn intro_end(&mut self) -> Directive {
    let next = self.segment + 1;
    if next < self.intro_segments.len() {
      self.segment = next;
      Directive::RepeatIntro(self.intro_segments[next].start)
    } else if self.repeats_done < self.intro_repeats {
      self.repeats_done += 1;
      self.segment = 0;
      Directive::RepeatIntro(self.intro_segments[0].start)
    } else {
      debug!("Introduction complete after {} repeats", self.repeats_done);
      self.playing_intro = false;
      Directive::JumpToStart
    }
  }

  pub fn end_of_score(&mut self) -> Directive {
    if self.playing_intro {
      self.playing_intro = false;
      Directive::JumpToStart
    } else if self.al_fine {
      Directive::Stop
    } else if self.verse_index + 1 < self.verses {
      self.verse_index += 1;
      Directive::JumpToStart
    } else {
      Directive::Stop
    }
  }
}
