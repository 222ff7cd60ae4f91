/// 触控板的发现、打开和能力判断（evdev 与 macOS 两个后端）
pub mod input_devices;

/// 原始事件与 slot 状态表
pub mod event_model;

/// slot 状态机：把原始事件流切成一帧一帧
pub mod touch_tracker;

/// 帧的编码与对外输出
pub mod event_dispatcher;

/// 主循环：取帧、编码、投递，直到被要求退出或出错
pub mod run_loop;

/// 退出信号 -> 取消请求
pub mod shutdown;

pub mod config;

pub mod error;

// 数据流：input_devices 选出唯一的设备 -> touch_tracker 消化事件并在 SYN_REPORT 处出帧
// -> event_dispatcher 编码成 JSON，按文本行或者 4 字节小端长度前缀写出去
// 浏览器扩展通过 native messaging 拉起本进程时用的就是带长度前缀的格式

// macOS 那边是回调驱动的，没有 slot 这回事，所以它直接实现 FrameSource，
// 两个后端的 JSON 字段也不一样，没打算统一

pub use config::Config;
pub use error::{ConfigError, EncodeError, SetupError, StreamError};
pub use run_loop::{FrameSource, RunContext, RunSummary, StopReason, run};
