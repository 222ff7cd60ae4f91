/// 原始输入事件与 slot 数据
pub mod event;

/// slot 状态表，按设备的 slot 下标镜像每个触点
pub mod slot_table;

pub use event::{Axis, ContactSlot, EventKind, EventTime, RawEvent};
pub use slot_table::SlotTable;
