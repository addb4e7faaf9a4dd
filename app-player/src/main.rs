use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn, LevelFilter};

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;

use failure::{Error, Fail};

use organ_play_core::midi::OutputDevice;
use organ_play_core::playback::{PlaybackOrchestrator, Report, ThreadTimer};
use organ_play_core::score::{EventPreProcessor, Score};
use organ_play_core::signal::SignalHandler;

mod config;
use crate::config::Config;

mod loader;

mod midi;
use crate::midi::{MidiDrivers, MidiError};

mod player;
use crate::player::Player;

const APP_NAME: &str = "Organ Play";

const ORGAN_PLAY_CONFIG: &str = "ORGAN_PLAY_CONFIG";
const DEFAULT_ORGAN_PLAY_CONFIG: &str = "player.toml";

const ORGAN_PLAY_LOG_CONFIG: &str = "ORGAN_PLAY_LOG_CONFIG";
const DEFAULT_ORGAN_PLAY_LOG_CONFIG: &str = "log4rs.yaml";

const CONSOLE_PATTERN: &str = "{m}{n}";

#[derive(Debug, Fail)]
enum MainError {
  #[fail(display = "Failed to init logging: {}", cause)]
  LoggingInit { cause: String },

  #[fail(display = "Usage: play <score.mid>")]
  MissingScore,

  #[fail(display = "Failed to get a MIDI driver: {}", cause)]
  GetMidiDriver { cause: MidiError },

  #[fail(display = "Failed to open a MIDI destination: {}", cause)]
  OpenMidiDestination { cause: MidiError },
}

fn main() -> Result<(), Error> {
  let console = init_logging()?;

  let config = init_config()?;

  if let Some(handle) = console {
    if config.player.playback.verbose {
      handle.set_config(console_config(LevelFilter::Debug)?);
    }
  }

  let score_path = std::env::args().nth(1).ok_or(MainError::MissingScore)?;

  let score = init_score(score_path.as_str())?;

  let device = init_midi(&config)?;

  let orchestrator = PlaybackOrchestrator::new(
    score.clone(),
    config.player.clone(),
    device.clone(),
    Box::new(ThreadTimer),
  );

  display_score(&score, &orchestrator, config.player.playback.reports_warnings());

  let _signal_handler = SignalHandler::install(device, config.player.output.note_space())?;

  let player = Player::spawn(orchestrator)?;

  for report in player.reports().iter() {
    match report {
      Report::Warning(_) => warn!("{}", report),
      _ => info!("{}", report),
    }
  }

  player.join()??;

  Ok(())
}

/// Returns the handle of the fallback console logger, which can still be reconfigured.
fn init_logging() -> Result<Option<Handle>, Error> {
  let log_config_path =
    std::env::var(ORGAN_PLAY_LOG_CONFIG).unwrap_or_else(|_| DEFAULT_ORGAN_PLAY_LOG_CONFIG.to_string());

  if Path::new(log_config_path.as_str()).exists() {
    log4rs::init_file(log_config_path.as_str(), Default::default()).map_err(|err| {
      MainError::LoggingInit {
        cause: err.to_string(),
      }
    })?;
    Ok(None)
  } else {
    let handle = log4rs::init_config(console_config(LevelFilter::Info)?).map_err(|err| {
      MainError::LoggingInit {
        cause: err.to_string(),
      }
    })?;
    Ok(Some(handle))
  }
}

fn console_config(level: LevelFilter) -> Result<LogConfig, Error> {
  let stdout = ConsoleAppender::builder()
    .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
    .build();

  let config = LogConfig::builder()
    .appender(Appender::builder().build("stdout", Box::new(stdout)))
    .build(Root::builder().appender("stdout").build(level))
    .map_err(|err| MainError::LoggingInit {
      cause: err.to_string(),
    })?;

  Ok(config)
}

fn init_config() -> Result<Config, Error> {
  let config_path =
    std::env::var(ORGAN_PLAY_CONFIG).unwrap_or_else(|_| DEFAULT_ORGAN_PLAY_CONFIG.to_string());

  if !Path::new(config_path.as_str()).exists() {
    debug!("No configuration at {}, using the defaults", config_path);
    return Ok(Config::default());
  }

  debug!("Loading player configuration from {} ...", config_path);
  let config = Config::from_file(config_path.as_str())?;
  debug!("{:#?}", config);

  Ok(config)
}

fn init_score(path: &str) -> Result<Arc<Score>, Error> {
  debug!("Loading score from {} ...", path);

  let raw = loader::load_file(path)?;
  let score = EventPreProcessor::new().process(raw)?;

  Ok(Arc::new(score))
}

fn init_midi(config: &Config) -> Result<Arc<dyn OutputDevice>, Error> {
  debug!("Initialising MIDI ...");

  let drivers = MidiDrivers::new();
  debug!("Available drivers: {:?}", drivers.drivers());

  let driver = drivers
    .driver(config.midi.driver.as_str(), APP_NAME)
    .map_err(|cause| MainError::GetMidiDriver { cause })?;

  debug!("MIDI Driver: {:?}", driver.id());
  for destination in driver.destinations() {
    debug!("=> {:?}", destination.name());
  }

  let device = driver
    .open(config.midi.destination.as_ref().map(String::as_str))
    .map_err(|cause| MainError::OpenMidiDestination { cause })?;

  debug!("Playing to {}", device.name());

  Ok(device)
}

fn display_score(score: &Score, orchestrator: &PlaybackOrchestrator, warnings: bool) {
  let metadata = score.metadata();

  let key = if metadata.key_signature().is_empty() {
    String::new()
  } else {
    format!(" in {}", metadata.key_signature())
  };
  let verses = orchestrator.verses();

  info!(
    "Playing: \"{}\"{} - {} verse{} at {} bpm",
    metadata.title(),
    key,
    verses,
    if verses == 1 { "" } else { "s" },
    orchestrator.displayed_tempo()
  );

  if warnings {
    for warning in metadata.warnings() {
      warn!("Warning: {}", warning);
    }
  }
}
