use num_enum::TryFromPrimitive;

/// 事件类型，数值与 linux `input-event-codes.h` 一致
pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0x00;
pub const SYN_DROPPED: u16 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u16)]
pub enum MtCode {
    Slot = 0x2f,
    TouchMajor = 0x30,
    TouchMinor = 0x31,
    WidthMajor = 0x32,
    WidthMinor = 0x33,
    Orientation = 0x34,
    PositionX = 0x35,
    PositionY = 0x36,
    TrackingId = 0x39,
    Pressure = 0x3a,
    Distance = 0x3b,
}

/// Per-slot axes that a contact record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    PositionX,
    PositionY,
    Pressure,
    WidthMajor,
    WidthMinor,
    TouchMajor,
    TouchMinor,
    Distance,
    Orientation,
}

impl Axis {
    pub const ALL: [Axis; 9] = [
        Axis::PositionX,
        Axis::PositionY,
        Axis::Pressure,
        Axis::WidthMajor,
        Axis::WidthMinor,
        Axis::TouchMajor,
        Axis::TouchMinor,
        Axis::Distance,
        Axis::Orientation,
    ];

    pub fn code(self) -> MtCode {
        match self {
            Axis::PositionX => MtCode::PositionX,
            Axis::PositionY => MtCode::PositionY,
            Axis::Pressure => MtCode::Pressure,
            Axis::WidthMajor => MtCode::WidthMajor,
            Axis::WidthMinor => MtCode::WidthMinor,
            Axis::TouchMajor => MtCode::TouchMajor,
            Axis::TouchMinor => MtCode::TouchMinor,
            Axis::Distance => MtCode::Distance,
            Axis::Orientation => MtCode::Orientation,
        }
    }
}

/// Kernel timestamp attached to every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTime {
    pub sec: i64,
    pub usec: i64,
}

impl EventTime {
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.usec as f64 / 1_000_000.0
    }
}

/// 设备送来的原始事件，只保留 (type, code, value)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub time: EventTime,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

/// 状态机真正关心的几类事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SlotSelect(i32),
    TrackingId(i32),
    Axis(Axis, i32),
    SyncReport,
    SyncDropped,
    Ignored,
}

impl RawEvent {
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self {
            time: EventTime::default(),
            kind,
            code,
            value,
        }
    }

    pub fn at(mut self, time: EventTime) -> Self {
        self.time = time;
        self
    }

    pub fn classify(&self) -> EventKind {
        match self.kind {
            EV_SYN => match self.code {
                SYN_REPORT => EventKind::SyncReport,
                SYN_DROPPED => EventKind::SyncDropped,
                _ => EventKind::Ignored,
            },
            EV_ABS => match MtCode::try_from(self.code) {
                Ok(MtCode::Slot) => EventKind::SlotSelect(self.value),
                Ok(MtCode::TrackingId) => EventKind::TrackingId(self.value),
                Ok(MtCode::PositionX) => EventKind::Axis(Axis::PositionX, self.value),
                Ok(MtCode::PositionY) => EventKind::Axis(Axis::PositionY, self.value),
                Ok(MtCode::Pressure) => EventKind::Axis(Axis::Pressure, self.value),
                Ok(MtCode::WidthMajor) => EventKind::Axis(Axis::WidthMajor, self.value),
                Ok(MtCode::WidthMinor) => EventKind::Axis(Axis::WidthMinor, self.value),
                Ok(MtCode::TouchMajor) => EventKind::Axis(Axis::TouchMajor, self.value),
                Ok(MtCode::TouchMinor) => EventKind::Axis(Axis::TouchMinor, self.value),
                Ok(MtCode::Distance) => EventKind::Axis(Axis::Distance, self.value),
                Ok(MtCode::Orientation) => EventKind::Axis(Axis::Orientation, self.value),
                // ABS_X/ABS_Y 之类的单点模拟轴不参与多点状态
                Err(_) => EventKind::Ignored,
            },
            _ => EventKind::Ignored,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactSlot {
    pub tracking_id: i32,
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    pub width_major: i32,
    pub width_minor: i32,
    pub touch_major: i32,
    pub touch_minor: i32,
    pub distance: i32,
    pub orientation: i32,
}

impl Default for ContactSlot {
    fn default() -> Self {
        Self {
            tracking_id: -1,
            x: 0,
            y: 0,
            pressure: 0,
            width_major: 0,
            width_minor: 0,
            touch_major: 0,
            touch_minor: 0,
            distance: 0,
            orientation: 0,
        }
    }
}

impl ContactSlot {
    pub fn is_active(&self) -> bool {
        self.tracking_id >= 0
    }

    pub fn set(&mut self, axis: Axis, value: i32) {
        let field = match axis {
            Axis::PositionX => &mut self.x,
            Axis::PositionY => &mut self.y,
            Axis::Pressure => &mut self.pressure,
            Axis::WidthMajor => &mut self.width_major,
            Axis::WidthMinor => &mut self.width_minor,
            Axis::TouchMajor => &mut self.touch_major,
            Axis::TouchMinor => &mut self.touch_minor,
            Axis::Distance => &mut self.distance,
            Axis::Orientation => &mut self.orientation,
        };
        *field = value;
    }
}
