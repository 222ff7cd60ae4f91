use serde::Serialize;

use crate::event_model::{ContactSlot, SlotTable};

/// One consistent snapshot of every active contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame<C> {
    pub frame: u64,
    /// Seconds, taken from the event that closed the frame.
    pub timestamp: f64,
    pub fingers: Vec<C>,
}

/// Contact record produced by the evdev backend. Units are whatever the
/// device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvdevContact {
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    pub wmaj: i32,
    pub wmin: i32,
    pub tmaj: i32,
    pub tmin: i32,
    pub distance: i32,
    /// Raw `ABS_MT_ORIENTATION`; evdev gives no unit, so it is passed through.
    pub angle: i32,
}

impl From<&ContactSlot> for EvdevContact {
    fn from(slot: &ContactSlot) -> Self {
        Self {
            x: slot.x,
            y: slot.y,
            pressure: slot.pressure,
            wmaj: slot.width_major,
            wmin: slot.width_minor,
            tmaj: slot.touch_major,
            tmin: slot.touch_minor,
            distance: slot.distance,
            angle: slot.orientation,
        }
    }
}

impl Frame<EvdevContact> {
    /// Active slots only, in slot index order.
    pub fn from_table(table: &SlotTable, frame: u64, timestamp: f64) -> Self {
        Self {
            frame,
            timestamp,
            fingers: table.active().map(EvdevContact::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

/// Contact record produced by the macOS MultitouchSupport backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacContact {
    pub frame: i32,
    /// Seconds, as stamped by the framework on each finger.
    pub timestamp: f64,
    pub identifier: i32,
    pub state: i32,
    /// Degrees; see [`radians_to_degrees`].
    pub angle: f64,
    pub major_axis: f32,
    pub minor_axis: f32,
    pub position: Vector2,
    pub velocity: Vector2,
    pub size: f32,
}

/// `r * 90 / atan2(1, 0)`, i.e. `r * 180 / π`.
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * 90.0 / 1f64.atan2(0.0)
}
