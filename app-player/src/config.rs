use failure::Error;

use serde_derive::Deserialize;

use std::fs::File;
use std::io::Read;

use organ_play_core::config::Config as PlayerConfig;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  #[serde(flatten)]
  pub player: PlayerConfig,
  pub midi: Midi,
}

impl Config {
  pub fn from_file<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let mut content = String::new();
    let path_str = path.into();
    let mut file = File::open(path_str)?;
    file.read_to_string(&mut content)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
  }

  #[allow(dead_code)]
  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Midi {
  pub driver: String,
  /// Name of the output to open, the first one when missing.
  pub destination: Option<String>,
}

impl Default for Midi {
  fn default() -> Midi {
    Midi {
      driver: crate::midi::DEFAULT_ID.to_string(),
      destination: None,
    }
  }
}
