use std::future::Future;
use std::io;

use crate::event_model::{ContactSlot, RawEvent};

/// 扫描输入设备目录，列出候选设备节点
pub mod discovery;

/// 判断设备是否支持多点触控、是否是触控板
pub mod probe;

/// 从候选设备里挑出唯一一个要追踪的触控板
pub mod selector;

/// 回调线程到主循环的有界帧队列，满了就丢新帧
pub mod frame_queue;

/// libevdev 后端
#[cfg(target_os = "linux")]
pub mod evdev;

/// MultitouchSupport 私有框架后端，回调驱动
#[cfg(target_os = "macos")]
pub mod multitouch_macos;

/// Event type/code pairs the prober asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `EV_ABS` as an event type
    AbsoluteEvents,
    /// `ABS_MT_SLOT`
    MtSlot,
    /// `ABS_X`
    AbsX,
    /// `ABS_Y`
    AbsY,
    /// `BTN_TOUCH`
    BtnTouch,
    /// `BTN_TOOL_DOUBLETAP`, the multi-finger tool button
    BtnToolDoubleTap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// `INPUT_PROP_DIRECT`, set by touchscreens
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Normal,
    /// Drain the device's resynchronisation events after a desync.
    Resync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Event(RawEvent),
    /// Nothing queued right now. In [`ReadMode::Resync`] this means the
    /// resync has completed.
    WouldBlock,
    /// The device dropped events; state must be resynchronised.
    Desync,
}

/// An opened input device.
///
/// Dropping the value releases the underlying handle, so every exit path
/// (including rejected candidates and error returns) closes it exactly once.
pub trait TouchDevice {
    fn name(&self) -> Option<&str>;

    fn has_capability(&self, capability: Capability) -> bool;

    fn has_property(&self, property: Property) -> bool;

    /// `None` when the device reports no multitouch slots.
    fn slot_count(&self) -> Option<usize>;

    /// Reads one event without blocking. `Err` is a fatal read failure.
    fn read_event(&mut self, mode: ReadMode) -> io::Result<ReadOutcome>;

    /// Resolves once `read_event` may have something new to return.
    fn wait_readable(&mut self) -> impl Future<Output = io::Result<()>>;

    /// Authoritative current value of one slot, if the backend keeps one.
    fn slot_snapshot(&self, _slot: usize) -> Option<ContactSlot> {
        None
    }

    /// Slot the device currently has selected, if the backend knows it.
    fn current_slot(&self) -> Option<usize> {
        None
    }

    fn label(&self) -> String {
        self.name().unwrap_or("<unnamed device>").to_string()
    }
}
