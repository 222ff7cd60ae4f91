use std::io;

use tracing::{debug, info, trace, warn};

use crate::error::SetupError;
use crate::event_dispatcher::{EvdevContact, Frame};
use crate::event_model::{EventKind, SlotTable};
use crate::input_devices::{ReadMode, ReadOutcome, TouchDevice, probe};
use crate::run_loop::FrameSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Validated, nothing read yet.
    Idle,
    /// At least one read attempted.
    Streaming,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pump {
    Frame(Frame<EvdevContact>),
    /// The device has nothing more queued.
    Drained,
}

/// Slot state machine for a slot-multiplexing (evdev type B) device.
///
/// Updates accumulate in `table` and are only published when a `SYN_REPORT`
/// closes the frame. `committed` keeps the last published state so a desync
/// can throw away a half-applied frame.
pub struct Tracker<D> {
    device: D,
    table: SlotTable,
    committed: SlotTable,
    state: TrackerState,
    frames: u64,
    resyncs: u64,
}

impl<D: TouchDevice> Tracker<D> {
    pub fn new(device: D) -> Result<Self, SetupError> {
        if !probe::is_multitouch_capable(&device) {
            return Err(SetupError::NotMultitouch {
                device: device.label(),
            });
        }
        let Some(slot_count) = device.slot_count() else {
            return Err(SetupError::NoSlots {
                device: device.label(),
            });
        };

        let mut table = SlotTable::new(slot_count);
        reload(&device, &mut table);
        info!(
            device = %device.label(),
            slots = slot_count,
            active = table.active().count(),
            "tracking device"
        );

        Ok(Self {
            device,
            committed: table.clone(),
            table,
            state: TrackerState::Idle,
            frames: 0,
            resyncs: 0,
        })
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn table(&self) -> &SlotTable {
        &self.table
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Reads queued events until a frame closes or the device runs dry.
    ///
    /// Never suspends. An `Err` is a fatal read failure.
    pub fn pump(&mut self) -> io::Result<Pump> {
        self.state = TrackerState::Streaming;
        loop {
            match self.device.read_event(ReadMode::Normal)? {
                ReadOutcome::WouldBlock => return Ok(Pump::Drained),
                ReadOutcome::Desync => self.resync()?,
                ReadOutcome::Event(event) => match event.classify() {
                    EventKind::SyncReport => {
                        self.committed.restore(&self.table);
                        self.frames += 1;
                        let frame = Frame::from_table(
                            &self.table,
                            self.frames,
                            event.time.as_secs_f64(),
                        );
                        trace!(frame = self.frames, fingers = frame.fingers.len(), "frame");
                        return Ok(Pump::Frame(frame));
                    }
                    EventKind::SyncDropped => self.resync()?,
                    kind => {
                        self.table.apply(kind);
                    }
                },
            }
        }
    }

    /// Runs to completion without suspending, so no frame is ever taken from
    /// a half-resynced table.
    fn resync(&mut self) -> io::Result<()> {
        self.resyncs += 1;
        warn!(resyncs = self.resyncs, "input events dropped, resyncing");

        // 撕裂窗口里的更新一律作废，从上一帧重新开始
        self.table.restore(&self.committed);
        let mut applied = 0usize;
        loop {
            match self.device.read_event(ReadMode::Resync)? {
                ReadOutcome::Event(event) => {
                    if self.table.apply(event.classify()) {
                        applied += 1;
                    }
                }
                ReadOutcome::Desync => {
                    self.table.restore(&self.committed);
                    applied = 0;
                }
                ReadOutcome::WouldBlock => break,
            }
        }

        reload(&self.device, &mut self.table);
        self.committed.restore(&self.table);
        debug!(applied, active = self.table.active().count(), "resync complete");
        Ok(())
    }
}

/// Copies whatever authoritative slot state the device keeps into `table`.
fn reload<D: TouchDevice>(device: &D, table: &mut SlotTable) {
    for index in 0..table.len() {
        if let Some(slot) = device.slot_snapshot(index) {
            table.load(index, slot);
        }
    }
    if let Some(current) = device.current_slot() {
        table.select_index(current);
    }
}

impl<D: TouchDevice> FrameSource for Tracker<D> {
    type Contact = EvdevContact;

    async fn next_frame(&mut self) -> io::Result<Frame<EvdevContact>> {
        loop {
            match self.pump()? {
                Pump::Frame(frame) => return Ok(frame),
                Pump::Drained => self.device.wait_readable().await?,
            }
        }
    }
}
