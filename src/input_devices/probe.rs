use super::{Capability, Property, TouchDevice};

/// `EV_ABS` plus `ABS_MT_SLOT`: enough to run the slot state machine.
pub fn is_multitouch_capable<D: TouchDevice + ?Sized>(device: &D) -> bool {
    device.has_capability(Capability::AbsoluteEvents) && device.has_capability(Capability::MtSlot)
}

/// A multitouch device that also looks like a touchpad.
///
/// Touchscreens carry the same MT axes and buttons, so the direct-input
/// property is what tells them apart.
pub fn is_touchpad<D: TouchDevice + ?Sized>(device: &D) -> bool {
    is_multitouch_capable(device)
        && device.has_capability(Capability::BtnTouch)
        && device.has_capability(Capability::BtnToolDoubleTap)
        && device.has_capability(Capability::AbsX)
        && device.has_capability(Capability::AbsY)
        && !device.has_property(Property::Direct)
}
