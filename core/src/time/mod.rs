pub mod clock;
pub mod elapsed;
pub mod signature;
pub mod tempo;
pub mod ticks;

pub use self::clock::ClockTime;
pub use self::elapsed::ElapsedTimer;
pub use self::signature::TimeSignature;
pub use self::tempo::Tempo;
pub use self::ticks::{Resolution, TicksTime};
