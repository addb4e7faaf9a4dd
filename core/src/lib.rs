pub mod config;
pub mod midi;
pub mod playback;
pub mod score;
pub mod signal;
pub mod time;

#[cfg(test)]
mod testing;
