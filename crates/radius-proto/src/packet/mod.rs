mod code;
mod id;
#[allow(clippy::module_inception)]
mod packet;

pub use code::Code;
pub use id::{IncrementingIdGenerator, PacketIdGenerator};
pub use packet::{Packet, PacketError, ReceivedFields};
