use super::event::{ContactSlot, EventKind};

/// In-memory mirror of the device's multitouch slots.
///
/// Slots are indexed positionally, the same way the device multiplexes them.
/// Finger identity across frames lives only in `tracking_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotTable {
    slots: Vec<ContactSlot>,
    /// `None` 表示最近一次选中的 slot 越界，后续轴事件全部丢弃
    current: Option<usize>,
}

impl SlotTable {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![ContactSlot::default(); slot_count],
            current: if slot_count > 0 { Some(0) } else { None },
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_slot(&self) -> Option<usize> {
        self.current
    }

    pub fn slots(&self) -> &[ContactSlot] {
        &self.slots
    }

    pub fn active(&self) -> impl Iterator<Item = &ContactSlot> {
        self.slots.iter().filter(|slot| slot.is_active())
    }

    pub fn select(&mut self, slot: i32) {
        match usize::try_from(slot) {
            Ok(index) => self.select_index(index),
            Err(_) => {
                tracing::debug!(slot, "negative slot selected");
                self.current = None;
            }
        }
    }

    pub fn select_index(&mut self, index: usize) {
        self.current = (index < self.slots.len()).then_some(index);
        if self.current.is_none() {
            tracing::debug!(index, slots = self.slots.len(), "slot select out of range");
        }
    }

    /// Applies one classified event. Returns `false` for kinds the table does
    /// not own (markers and ignored events).
    pub fn apply(&mut self, kind: EventKind) -> bool {
        match kind {
            EventKind::SlotSelect(slot) => self.select(slot),
            EventKind::TrackingId(id) => {
                if let Some(slot) = self.current_mut() {
                    slot.tracking_id = id;
                }
            }
            EventKind::Axis(axis, value) => {
                if let Some(slot) = self.current_mut() {
                    slot.set(axis, value);
                }
            }
            EventKind::SyncReport | EventKind::SyncDropped | EventKind::Ignored => return false,
        }
        true
    }

    /// Overwrites one slot with an authoritative value read from the device.
    pub fn load(&mut self, index: usize, slot: ContactSlot) {
        if let Some(entry) = self.slots.get_mut(index) {
            *entry = slot;
        }
    }

    /// Restores the contents of `other`, keeping this table's allocation.
    pub fn restore(&mut self, other: &SlotTable) {
        self.slots.clone_from(&other.slots);
        self.current = other.current;
    }

    fn current_mut(&mut self) -> Option<&mut ContactSlot> {
        let index = self.current?;
        self.slots.get_mut(index)
    }
}
