//! Key signature names, looked up from the sharps/flats count of a key signature meta event.

pub const KEYS: [&str; 18] = [
  "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#",
  "e#",
];

pub const MAJOR_KEY_OFFSET: i32 = 6;
pub const MINOR_KEY_OFFSET: i32 = 9;

const MINOR_SUFFIX: &str = " minor";

/// Name of the key, `None` when the table has no entry for it.
pub fn key_name(sharps_flats: i8, minor: bool) -> Option<String> {
  let offset = if minor { MINOR_KEY_OFFSET } else { MAJOR_KEY_OFFSET };
  let index = i32::from(sharps_flats) + offset;
  if index < 0 || index as usize >= KEYS.len() {
    return None;
  }
  let name = KEYS[index as usize];
  if minor {
    Some(format!("{}{}", name, MINOR_SUFFIX))
  } else {
    Some(name.to_string())
  }
}
