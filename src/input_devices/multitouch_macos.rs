//! Frame source over Apple's private MultitouchSupport framework.
//!
//! The framework hands over complete frames through a C callback on its own
//! thread, so there is no slot table here: the callback converts the finger
//! array and pushes it into a bounded queue the run loop awaits. Frames that
//! arrive while the queue is full are dropped.

use std::ffi::c_void;
use std::io;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::error::SetupError;
use crate::event_dispatcher::{Frame, MacContact, Vector2, radians_to_degrees};
use crate::input_devices::frame_queue::{
    FRAME_QUEUE_CAPACITY, FrameConsumer, FrameProducer, frame_queue,
};
use crate::run_loop::FrameSource;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct MtPoint {
    x: f32,
    y: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct MtReadout {
    pos: MtPoint,
    vel: MtPoint,
}

/// Layout of one contact as the framework reports it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
struct Finger {
    frame: i32,
    timestamp: f64,
    identifier: i32,
    state: i32,
    unknown1: i32,
    unknown2: i32,
    normalized: MtReadout,
    size: f32,
    zero1: i32,
    angle: f32,
    major_axis: f32,
    minor_axis: f32,
    mm: MtReadout,
    zero2: [i32; 2],
    unknown3: f32,
}

type MtDeviceRef = *mut c_void;
type ContactFrameCallback = extern "C" fn(i32, *const Finger, i32, f64, i32) -> i32;

// 链接参数在 build.rs 里
unsafe extern "C" {
    fn MTDeviceCreateDefault() -> MtDeviceRef;
    fn MTRegisterContactFrameCallback(device: MtDeviceRef, callback: ContactFrameCallback);
    fn MTUnregisterContactFrameCallback(device: MtDeviceRef, callback: ContactFrameCallback);
    fn MTDeviceStart(device: MtDeviceRef, mode: i32);
    fn MTDeviceStop(device: MtDeviceRef);
    fn MTDeviceRelease(device: MtDeviceRef);
}

/// The callback has no user-data pointer, so the sender has to be global.
static FRAMES: Mutex<Option<FrameProducer<MacContact>>> = Mutex::new(None);

fn contact(finger: &Finger) -> MacContact {
    MacContact {
        frame: finger.frame,
        timestamp: finger.timestamp,
        identifier: finger.identifier,
        state: finger.state,
        angle: radians_to_degrees(f64::from(finger.angle)),
        major_axis: finger.major_axis,
        minor_axis: finger.minor_axis,
        position: Vector2 {
            x: finger.normalized.pos.x,
            y: finger.normalized.pos.y,
        },
        velocity: Vector2 {
            x: finger.normalized.vel.x,
            y: finger.normalized.vel.y,
        },
        size: finger.size,
    }
}

extern "C" fn on_contact_frame(
    _device: i32,
    data: *const Finger,
    count: i32,
    timestamp: f64,
    frame: i32,
) -> i32 {
    let fingers: &[Finger] = match usize::try_from(count) {
        Ok(count) if count > 0 && !data.is_null() => {
            // SAFETY: the framework passes `count` contiguous fingers that stay
            // valid for the duration of the callback.
            unsafe { std::slice::from_raw_parts(data, count) }
        }
        _ => &[],
    };

    let frame = Frame {
        frame: u64::try_from(frame).unwrap_or_default(),
        timestamp,
        fingers: fingers.iter().map(contact).collect(),
    };

    if let Ok(producer) = FRAMES.lock() {
        if let Some(producer) = producer.as_ref() {
            producer.push(frame);
        }
    }
    0
}

/// The default multitouch device, started and registered for callbacks.
///
/// Only one may exist at a time.
pub struct MultitouchDevice {
    device: MtDeviceRef,
    frames: FrameConsumer<MacContact>,
}

impl MultitouchDevice {
    pub fn start_default() -> Result<Self, SetupError> {
        let (tx, rx) = frame_queue(FRAME_QUEUE_CAPACITY);
        {
            let mut slot = FRAMES
                .lock()
                .map_err(|_| SetupError::Backend("callback state poisoned".into()))?;
            if slot.is_some() {
                return Err(SetupError::Backend("multitouch device already started".into()));
            }
            *slot = Some(tx);
        }

        // SAFETY: plain constructor; a null result means no device.
        let device = unsafe { MTDeviceCreateDefault() };
        if device.is_null() {
            clear_sender();
            return Err(SetupError::NotFound);
        }

        // SAFETY: `device` is a live reference from MTDeviceCreateDefault and the
        // callback is a plain `extern "C" fn` with the expected signature.
        unsafe {
            MTRegisterContactFrameCallback(device, on_contact_frame);
            MTDeviceStart(device, 0);
        }
        info!("multitouch device started");

        Ok(Self { device, frames: rx })
    }
}

fn clear_sender() {
    match FRAMES.lock() {
        Ok(mut slot) => *slot = None,
        Err(poisoned) => *poisoned.into_inner() = None,
    }
}

impl Drop for MultitouchDevice {
    fn drop(&mut self) {
        // SAFETY: `device` was created in `start_default` and is released only here.
        unsafe {
            MTUnregisterContactFrameCallback(self.device, on_contact_frame);
            MTDeviceStop(self.device);
            MTDeviceRelease(self.device);
        }
        clear_sender();
        info!(dropped = self.frames.dropped(), "multitouch device stopped");
    }
}

impl FrameSource for MultitouchDevice {
    type Contact = MacContact;

    async fn next_frame(&mut self) -> io::Result<Frame<MacContact>> {
        match self.frames.recv().await {
            Some(frame) => Ok(frame),
            None => {
                warn!("multitouch callback channel closed");
                Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "multitouch device stopped delivering frames",
                ))
            }
        }
    }
}
