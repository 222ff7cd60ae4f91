use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use evdev_rs::enums::{EV_ABS, EV_KEY, EventCode, EventType, InputProp};
use evdev_rs::util::event_code_to_int;
use evdev_rs::{Device, DeviceWrapper, InputEvent, ReadFlag, ReadStatus};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::debug;

use super::discovery::event_nodes;
use super::{Capability, Property, ReadMode, ReadOutcome, TouchDevice};
use crate::error::SetupError;
use crate::event_model::{ContactSlot, EventTime, RawEvent};

/// A libevdev handle on an `/dev/input/eventN` node.
///
/// The node is opened non-blocking. libevdev owns one descriptor; a duplicate
/// of it is handed to tokio for readiness once streaming starts.
pub struct EvdevDevice {
    path: PathBuf,
    device: Device,
    readiness: Readiness<File>,
}

impl EvdevDevice {
    pub fn open(path: &Path) -> Result<Self, SetupError> {
        let open_error = |source| SetupError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(open_error)?;
        let watch = file.try_clone().map_err(open_error)?;
        let device = Device::new_from_file(file).map_err(open_error)?;

        Ok(Self {
            path: path.to_path_buf(),
            device,
            readiness: Readiness::new(watch),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A descriptor that is moved into the tokio reactor on the first wait, since
/// `open` may run before any runtime exists.
struct Readiness<T: AsRawFd> {
    pending: Option<T>,
    registered: Option<AsyncFd<T>>,
}

impl<T: AsRawFd> Readiness<T> {
    fn new(fd: T) -> Self {
        Self {
            pending: Some(fd),
            registered: None,
        }
    }

    async fn wait(&mut self) -> io::Result<()> {
        if let Some(fd) = self.pending.take() {
            self.registered = Some(AsyncFd::with_interest(fd, Interest::READABLE)?);
        }
        let Some(registered) = &self.registered else {
            return Err(io::Error::other("readiness registration failed earlier"));
        };
        let mut guard = registered.readable().await?;
        // 之后会一直读到 EAGAIN，所以这里可以直接清掉就绪状态
        guard.clear_ready();
        Ok(())
    }
}

/// Opens every event node under `dir` lazily, skipping nodes that cannot be
/// opened (usually a permissions problem on unrelated devices).
pub fn candidates(dir: &Path) -> Result<impl Iterator<Item = EvdevDevice>, SetupError> {
    let nodes = event_nodes(dir)?;
    Ok(nodes
        .into_iter()
        .filter_map(|path| match EvdevDevice::open(&path) {
            Ok(device) => Some(device),
            Err(e) => {
                debug!(error = %e, "skipping candidate");
                None
            }
        }))
}

impl TouchDevice for EvdevDevice {
    fn name(&self) -> Option<&str> {
        self.device.name()
    }

    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::AbsoluteEvents => self.device.has_event_type(&EventType::EV_ABS),
            Capability::MtSlot => self
                .device
                .has_event_code(&EventCode::EV_ABS(EV_ABS::ABS_MT_SLOT)),
            Capability::AbsX => self.device.has_event_code(&EventCode::EV_ABS(EV_ABS::ABS_X)),
            Capability::AbsY => self.device.has_event_code(&EventCode::EV_ABS(EV_ABS::ABS_Y)),
            Capability::BtnTouch => self
                .device
                .has_event_code(&EventCode::EV_KEY(EV_KEY::BTN_TOUCH)),
            Capability::BtnToolDoubleTap => self
                .device
                .has_event_code(&EventCode::EV_KEY(EV_KEY::BTN_TOOL_DOUBLETAP)),
        }
    }

    fn has_property(&self, property: Property) -> bool {
        match property {
            Property::Direct => self.device.has_property(&InputProp::INPUT_PROP_DIRECT),
        }
    }

    fn slot_count(&self) -> Option<usize> {
        self.device
            .num_slots()
            .and_then(|n| usize::try_from(n).ok())
    }

    fn read_event(&mut self, mode: ReadMode) -> io::Result<ReadOutcome> {
        let flags = match mode {
            ReadMode::Normal => ReadFlag::NORMAL,
            ReadMode::Resync => ReadFlag::SYNC,
        };

        match self.device.next_event(flags) {
            Ok((ReadStatus::Success, event)) => Ok(ReadOutcome::Event(raw_event(&event))),
            // 普通模式下拿到 Sync 状态时，这个事件就是 SYN_DROPPED
            Ok((ReadStatus::Sync, _)) if mode == ReadMode::Normal => Ok(ReadOutcome::Desync),
            Ok((ReadStatus::Sync, event)) => Ok(ReadOutcome::Event(raw_event(&event))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadOutcome::WouldBlock),
            Err(e) => Err(e),
        }
    }

    async fn wait_readable(&mut self) -> io::Result<()> {
        self.readiness.wait().await
    }

    fn slot_snapshot(&self, slot: usize) -> Option<ContactSlot> {
        let slot = u32::try_from(slot).ok()?;
        let value = |code: EV_ABS| {
            self.device
                .slot_value(slot, &EventCode::EV_ABS(code))
                .unwrap_or(-1)
        };

        Some(ContactSlot {
            tracking_id: value(EV_ABS::ABS_MT_TRACKING_ID),
            x: value(EV_ABS::ABS_MT_POSITION_X),
            y: value(EV_ABS::ABS_MT_POSITION_Y),
            pressure: value(EV_ABS::ABS_MT_PRESSURE),
            width_major: value(EV_ABS::ABS_MT_WIDTH_MAJOR),
            width_minor: value(EV_ABS::ABS_MT_WIDTH_MINOR),
            touch_major: value(EV_ABS::ABS_MT_TOUCH_MAJOR),
            touch_minor: value(EV_ABS::ABS_MT_TOUCH_MINOR),
            distance: value(EV_ABS::ABS_MT_DISTANCE),
            orientation: value(EV_ABS::ABS_MT_ORIENTATION),
        })
    }

    fn current_slot(&self) -> Option<usize> {
        self.device
            .current_slot()
            .and_then(|slot| usize::try_from(slot).ok())
    }

    fn label(&self) -> String {
        format!(
            "{} ({})",
            self.name().unwrap_or("<unnamed device>"),
            self.path.display()
        )
    }
}

fn raw_event(event: &InputEvent) -> RawEvent {
    let (kind, code) = event_code_to_int(&event.event_code);
    RawEvent {
        time: EventTime {
            sec: event.time.tv_sec as i64,
            usec: event.time.tv_usec as i64,
        },
        kind: kind as u16,
        code: code as u16,
        value: event.value,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[tokio::test]
    async fn readiness_moves_the_descriptor_into_the_reactor() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        reader.set_nonblocking(true).unwrap();
        let fd = reader.as_raw_fd();
        let mut readiness = Readiness::new(reader);

        writer.write_all(b"x").unwrap();
        readiness.wait().await.unwrap();

        assert!(readiness.pending.is_none());
        let registered = readiness.registered.as_ref().unwrap();
        assert_eq!(registered.get_ref().as_raw_fd(), fd, "no extra descriptor");
    }

    #[test]
    fn missing_node_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event0");
        assert!(matches!(
            EvdevDevice::open(&path),
            Err(SetupError::Open { .. })
        ));
    }
}
