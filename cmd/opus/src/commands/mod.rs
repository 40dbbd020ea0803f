//! CLI commands module.

mod decode;
mod encode;
mod inspect;
mod util;

pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use inspect::InspectCommand;

pub(crate) use util::*;
