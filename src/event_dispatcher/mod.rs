/// 帧和每个后端各自的触点记录
pub mod frame;

/// 帧 -> JSON 消息，带字节上限
pub mod encoder;

/// 消息的出口：按行文本或带长度前缀的二进制
pub mod channel;

pub use channel::{Deliver, FramedChannel, OutputChannel, OutputMode, TextChannel};
pub use encoder::{Encoded, MessageEncoder, NATIVE_MESSAGE_LIMIT};
pub use frame::{EvdevContact, Frame, MacContact, Vector2, radians_to_degrees};
