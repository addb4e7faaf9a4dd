use std::fmt;

use crate::score::ScoreWarning;
use crate::time::ClockTime;

/// Progress of a playback session, sent to whoever displays it.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
  Introduction,
  Verse { number: u32, total: u32 },
  Ritardando,
  DaCapo,
  Pause(ClockTime),
  Warning(ScoreWarning),
  Finished { elapsed: ClockTime },
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Report::Introduction => write!(f, " Playing introduction"),
      Report::Verse { number, total } => write!(f, " Playing verse {} of {}", number, total),
      Report::Ritardando => write!(f, "  Ritardando"),
      Report::DaCapo => write!(f, "  D.C. al Fine"),
      Report::Pause(duration) => write!(f, "  Pause {:.1}s", duration.to_seconds()),
      Report::Warning(warning) => write!(f, "Warning: {}", warning),
      Report::Finished { elapsed } => write!(f, "Fine - elapsed time {}", elapsed),
    }
  }
}
