use std::sync::Arc;

use crossbeam_channel::Sender;

use log::{debug, info, trace};

use crate::config::Config;
use crate::midi::{Message, OutputDevice};
use crate::score::{Event, Marker, Payload, Score, ScoreWarning};
use crate::time::{ClockTime, Resolution, Tempo, TicksTime};

use super::context::PlaybackContext;
use super::director::{Directive, MusicalDirector};
use super::report::Report;
use super::timer::Timer;
use super::{PlaybackError, PlaybackResult};

pub const DEFAULT_VERSES: u32 = 1;

enum Flow {
  Continue,
  Stop,
}

/// Real time needed to play `delta` ticks at the tempo, divided by the playback rate.
pub fn event_delay(delta: TicksTime, tempo: Tempo, resolution: Resolution, rate: f64) -> ClockTime {
  delta.to_clock(tempo, resolution).scale_down(rate)
}

fn tempo_factor(tempo_override: Option<u32>, file_tempo: u64) -> f64 {
  match tempo_override {
    Some(bpm) if bpm > 0 && file_tempo > 0 => f64::from(bpm) / file_tempo as f64,
    _ => 1.0,
  }
}

/// Drives a score through an output device in real time.
///
/// Every call to `play` is an independent session with its own context.
pub struct PlaybackOrchestrator {
  score: Arc<Score>,
  config: Config,
  device: Arc<dyn OutputDevice>,
  timer: Box<dyn Timer>,
  reports: Option<Sender<Report>>,
  base_speed: f64,
  speed: f64,
  verses: u32,
  play_intro: bool,
}

impl PlaybackOrchestrator {
  pub fn new(
    score: Arc<Score>,
    config: Config,
    device: Arc<dyn OutputDevice>,
    timer: Box<dyn Timer>,
  ) -> PlaybackOrchestrator {
    let metadata = score.metadata();

    let verses = config
      .playback
      .verses
      .filter(|verses| *verses > 0)
      .or_else(|| metadata.verses())
      .unwrap_or(DEFAULT_VERSES);

    let play_intro = config.playback.play_intro && metadata.has_intro();
    let base_speed = config.playback.speed();
    let speed = base_speed * tempo_factor(config.playback.tempo, metadata.file_tempo());

    PlaybackOrchestrator {
      score,
      config,
      device,
      timer,
      reports: None,
      base_speed,
      speed,
      verses,
      play_intro,
    }
  }

  pub fn with_reports(mut self, reports: Sender<Report>) -> Self {
    self.reports = Some(reports);
    self
  }

  pub fn score(&self) -> &Score {
    &self.score
  }

  pub fn verses(&self) -> u32 {
    self.verses
  }

  pub fn plays_intro(&self) -> bool {
    self.play_intro
  }

  /// Rate applied to every delay: the configured speed times the tempo override factor.
  pub fn speed(&self) -> f64 {
    self.speed
  }

  /// Beats per minute as heard, for display.
  pub fn displayed_tempo(&self) -> u64 {
    let bpm = self
      .config
      .playback
      .tempo
      .map(u64::from)
      .unwrap_or_else(|| self.score.metadata().file_tempo());
    (bpm as f64 * self.base_speed).round() as u64
  }

  /// Plays a whole session and returns how long it took.
  pub fn play(&mut self) -> PlaybackResult<ClockTime> {
    let score = self.score.clone();
    let mut ctx = PlaybackContext::new(&score, &self.config, self.verses);

    ctx.state.start(self.play_intro)?;
    ctx.elapsed.start();

    let start = ctx.director.start(self.play_intro);
    ctx.seek(&score, start);
    debug!(
      "Playing from tick {}: intro={} verses={} speed={}",
      start, self.play_intro, self.verses, self.speed
    );

    if self.play_intro {
      self.report(Report::Introduction);
    } else {
      self.report_verse(&ctx);
    }

    let result = self.run(&score, &mut ctx);
    let released = self.release_notes(&mut ctx);
    ctx.state.stop();
    result?;
    released?;

    let elapsed = ctx.elapsed.elapsed();
    info!("Finished after {}", elapsed);
    self.report(Report::Finished { elapsed });
    Ok(elapsed)
  }

  fn run(&mut self, score: &Score, ctx: &mut PlaybackContext) -> PlaybackResult<()> {
    loop {
      let flow = match score.events().get(ctx.position) {
        Some(event) => self.play_event(score, ctx, event)?,
        None => {
          self.wait_until(score, ctx, score.end());
          self.direct(score, ctx, MusicalDirector::end_of_score)?
        }
      };

      if let Flow::Stop = flow {
        ctx.state.finish()?;
        return Ok(());
      }
    }
  }

  fn play_event(
    &mut self,
    score: &Score,
    ctx: &mut PlaybackContext,
    event: &Event,
  ) -> PlaybackResult<Flow> {
    self.wait_until(score, ctx, event.tick);
    ctx.ritardando.on_event(event.tick);
    ctx.position += 1;

    match &event.payload {
      Payload::Tempo(tempo) => {
        trace!("Tempo {} at tick {}", tempo, event.tick);
        ctx.tempo = *tempo;
        Ok(Flow::Continue)
      }
      Payload::Channel(message) => {
        self.send(ctx, event.tick, message)?;
        Ok(Flow::Continue)
      }
      Payload::Marker(marker) => self.on_marker(score, ctx, event.tick, marker),
    }
  }

  fn wait_until(&mut self, score: &Score, ctx: &mut PlaybackContext, tick: TicksTime) {
    let delta = tick - ctx.tick;
    if !delta.is_zero() {
      let rate = self.speed * ctx.ritardando.multiplier();
      let delay = event_delay(delta, ctx.tempo, score.resolution(), rate);
      self.timer.sleep(delay);
    }
    ctx.tick = ctx.tick.max(tick);
  }

  fn on_marker(
    &mut self,
    score: &Score,
    ctx: &mut PlaybackContext,
    tick: TicksTime,
    marker: &Marker,
  ) -> PlaybackResult<Flow> {
    if self.config.playback.verbose {
      debug!("Marker {} at tick {}", marker, tick);
    }
    match marker {
      Marker::Ritardando => {
        if ctx.director.allows_ritardando() && !ctx.ritardando.is_active() {
          ctx.state.begin_ritardando()?;
          ctx.ritardando.trigger(tick);
          self.report(Report::Ritardando);
        }
        Ok(Flow::Continue)
      }
      Marker::Pause(ticks) => {
        self.pause(score, ctx, *ticks)?;
        Ok(Flow::Continue)
      }
      _ => self.direct(score, ctx, |director| director.resolve(marker)),
    }
  }

  /// Asks the director what to do next and carries it out.
  fn direct<F>(&mut self, score: &Score, ctx: &mut PlaybackContext, resolve: F) -> PlaybackResult<Flow>
  where
    F: FnOnce(&mut MusicalDirector) -> Directive,
  {
    let was_intro = ctx.director.is_playing_intro();
    let was_al_fine = ctx.director.is_al_fine();
    let verse = ctx.director.verse_index();

    let directive = resolve(&mut ctx.director);
    debug!("{:?} at tick {}", directive, ctx.tick);

    match directive {
      Directive::Stop => return Ok(Flow::Stop),
      Directive::Continue => {}
      Directive::JumpToStart => self.jump(score, ctx, TicksTime::zero())?,
      Directive::RepeatIntro(tick) => self.jump(score, ctx, tick)?,
    }

    if was_intro && !ctx.director.is_playing_intro() {
      self.complete_intro(score, ctx)?;
    } else if ctx.director.verse_index() != verse {
      self.pause(score, ctx, score.metadata().pause())?;
      self.report_verse(ctx);
    } else if ctx.director.is_al_fine() && !was_al_fine {
      self.report(Report::DaCapo);
    }

    Ok(Flow::Continue)
  }

  fn jump(&mut self, score: &Score, ctx: &mut PlaybackContext, tick: TicksTime) -> PlaybackResult<()> {
    self.release_notes(ctx)?;
    ctx.ritardando.reset();
    ctx.state.end_ritardando();
    ctx.seek(score, tick);
    Ok(())
  }

  fn complete_intro(&mut self, score: &Score, ctx: &mut PlaybackContext) -> PlaybackResult<()> {
    ctx.state.intro_complete()?;
    ctx.ritardando.reset();
    if score.metadata().has_potential_stuck_note() && self.config.playback.reports_warnings() {
      self.report(Report::Warning(ScoreWarning::PotentialStuckNote));
    }
    self.pause(score, ctx, score.metadata().pause())?;
    self.report_verse(ctx);
    Ok(())
  }

  /// Silence for the ticks at the file tempo, whatever the playback speed.
  fn pause(&mut self, score: &Score, ctx: &mut PlaybackContext, ticks: TicksTime) -> PlaybackResult<()> {
    if ticks.is_zero() {
      return Ok(());
    }
    let duration = ticks.to_clock(score.metadata().tempo(), score.resolution());
    ctx.state.pause()?;
    self.report(Report::Pause(duration));
    self.timer.sleep(duration);
    ctx.state.resume()?;
    Ok(())
  }

  fn send(&self, ctx: &mut PlaybackContext, tick: TicksTime, message: &Message) -> PlaybackResult<()> {
    if self.config.playback.verbose {
      debug!("{:>8} {:?}", tick, message);
    }
    self
      .device
      .send(message)
      .map_err(|cause| PlaybackError::Device { tick, cause })?;
    ctx.track(message);
    Ok(())
  }

  fn release_notes(&self, ctx: &mut PlaybackContext) -> PlaybackResult<()> {
    let tick = ctx.tick;
    for message in ctx.take_note_offs() {
      trace!("Releasing {:?}", message);
      self
        .device
        .send(&message)
        .map_err(|cause| PlaybackError::Device { tick, cause })?;
    }
    Ok(())
  }

  fn report_verse(&self, ctx: &PlaybackContext) {
    self.report(Report::Verse {
      number: ctx.director.verse_number(),
      total: ctx.director.verses(),
    });
  }

  fn report(&self, report: Report) {
    debug!("{}", report);
    if let Some(reports) = self.reports.as_ref() {
      drop(reports.send(report));
    }
  }
}
