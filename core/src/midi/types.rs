pub type U4 = u8;
pub type U7 = u8;
pub type U14 = u16;

pub const MAX_CHANNEL: U4 = 15;
pub const MAX_NOTE: U7 = 127;
