pub mod device;
pub mod encoder;
pub mod messages;
pub mod types;

pub use self::device::{DeviceError, DeviceResult, NoteSpace, OutputDevice};
pub use self::encoder::Encoder;
pub use self::messages::Message;
