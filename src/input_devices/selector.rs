use tracing::{debug, info};

use super::{TouchDevice, probe};
use crate::error::SetupError;

/// Name fragments of well-known touchpad controllers.
pub const DEFAULT_PRIORITY_PATTERNS: &[&str] = &[
    "touchpad",
    "trackpad",
    "synaptics",
    "elan",
    "alps",
    // Apple USB trackpads on older MacBooks
    "bcm5974",
];

/// Case-insensitive substring patterns for preferred devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityPatterns {
    patterns: Vec<String>,
}

impl PriorityPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, name: Option<&str>) -> bool {
        let Some(name) = name else {
            return false;
        };
        let name = name.to_lowercase();
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }
}

impl Default for PriorityPatterns {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY_PATTERNS)
    }
}

/// Picks the device to track.
///
/// Candidates are pulled lazily and in order. The first touchpad whose name
/// matches a priority pattern wins at once; otherwise the first touchpad seen
/// is returned. Every other candidate is dropped (and so released) before the
/// next one is pulled.
pub fn select_device<D, I>(candidates: I, patterns: &PriorityPatterns) -> Result<D, SetupError>
where
    D: TouchDevice,
    I: IntoIterator<Item = D>,
{
    let mut fallback: Option<D> = None;

    for device in candidates {
        let label = device.label();
        if !probe::is_touchpad(&device) {
            debug!(device = %label, "not a touchpad, releasing");
            continue;
        }

        if patterns.matches(device.name()) {
            if let Some(previous) = fallback.take() {
                debug!(device = %previous.label(), "releasing fallback touchpad");
            }
            info!(device = %label, "selected priority touchpad");
            return Ok(device);
        }

        if fallback.is_none() {
            debug!(device = %label, "keeping touchpad as fallback");
            fallback = Some(device);
        } else {
            debug!(device = %label, "fallback already chosen, releasing");
        }
    }

    match fallback {
        Some(device) => {
            info!(device = %device.label(), "selected first touchpad");
            Ok(device)
        }
        None => Err(SetupError::NotFound),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::input_devices::{Capability, Property, ReadMode, ReadOutcome};

    pub(crate) type Log = Rc<RefCell<Vec<String>>>;

    pub(crate) struct FakeDevice {
        name: String,
        capabilities: HashSet<Capability>,
        properties: HashSet<Property>,
        released: Option<Log>,
    }

    impl FakeDevice {
        pub(crate) fn touchpad(name: &str) -> Self {
            Self {
                name: name.to_string(),
                capabilities: [
                    Capability::AbsoluteEvents,
                    Capability::MtSlot,
                    Capability::AbsX,
                    Capability::AbsY,
                    Capability::BtnTouch,
                    Capability::BtnToolDoubleTap,
                ]
                .into_iter()
                .collect(),
                properties: HashSet::new(),
                released: None,
            }
        }

        pub(crate) fn touchscreen(name: &str) -> Self {
            let mut device = Self::touchpad(name);
            device.properties.insert(Property::Direct);
            device
        }

        pub(crate) fn without(mut self, capability: Capability) -> Self {
            self.capabilities.remove(&capability);
            self
        }

        fn logged(mut self, log: &Log) -> Self {
            self.released = Some(log.clone());
            self
        }
    }

    impl Drop for FakeDevice {
        fn drop(&mut self) {
            if let Some(log) = &self.released {
                log.borrow_mut().push(self.name.clone());
            }
        }
    }

    impl TouchDevice for FakeDevice {
        fn name(&self) -> Option<&str> {
            Some(&self.name)
        }

        fn has_capability(&self, capability: Capability) -> bool {
            self.capabilities.contains(&capability)
        }

        fn has_property(&self, property: Property) -> bool {
            self.properties.contains(&property)
        }

        fn slot_count(&self) -> Option<usize> {
            Some(5)
        }

        fn read_event(&mut self, _mode: ReadMode) -> io::Result<ReadOutcome> {
            Ok(ReadOutcome::WouldBlock)
        }

        async fn wait_readable(&mut self) -> io::Result<()> {
            std::future::pending().await
        }
    }

    #[test]
    fn later_priority_touchpad_beats_earlier_plain_one() {
        let log = Log::default();
        let candidates = vec![
            FakeDevice::touchpad("Generic Pointer Pad").logged(&log),
            FakeDevice::touchpad("SynPS/2 Synaptics TouchPad").logged(&log),
        ];

        let chosen = select_device(candidates, &PriorityPatterns::default()).unwrap();
        assert_eq!(chosen.name(), Some("SynPS/2 Synaptics TouchPad"));
        assert_eq!(*log.borrow(), vec!["Generic Pointer Pad".to_string()]);
    }

    #[test]
    fn priority_touchpad_first_stops_enumeration() {
        let log = Log::default();
        let opened = Rc::new(RefCell::new(0));
        let names = ["ELAN0501:00 04F3:3060 Touchpad", "Generic Pointer Pad"];
        let candidates = names.iter().map(|name| {
            *opened.borrow_mut() += 1;
            FakeDevice::touchpad(name).logged(&log)
        });

        let chosen = select_device(candidates, &PriorityPatterns::default()).unwrap();
        assert_eq!(chosen.name(), Some(names[0]));
        assert_eq!(*opened.borrow(), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn lone_plain_touchpad_is_selected() {
        let chosen = select_device(
            vec![FakeDevice::touchpad("Generic Pointer Pad")],
            &PriorityPatterns::default(),
        )
        .unwrap();
        assert_eq!(chosen.name(), Some("Generic Pointer Pad"));
    }

    #[test]
    fn touchscreen_only_is_not_found() {
        let log = Log::default();
        let result = select_device(
            vec![FakeDevice::touchscreen("ELAN Touchscreen").logged(&log)],
            &PriorityPatterns::default(),
        );
        assert!(matches!(result, Err(SetupError::NotFound)));
        assert_eq!(*log.borrow(), vec!["ELAN Touchscreen".to_string()]);
    }

    #[test]
    fn rejected_candidates_are_released_before_next_is_opened() {
        let log = Log::default();
        let seen_at_open = Rc::new(RefCell::new(Vec::new()));
        let names = ["Power Button", "Generic Pointer Pad", "Another Pad"];
        let candidates = names.iter().map(|name| {
            seen_at_open.borrow_mut().push(log.borrow().len());
            let device = FakeDevice::touchpad(name).logged(&log);
            if *name == "Power Button" {
                device.without(Capability::MtSlot)
            } else {
                device
            }
        });

        let chosen = select_device(candidates, &PriorityPatterns::default()).unwrap();
        assert_eq!(chosen.name(), Some("Generic Pointer Pad"));
        // "Power Button" was released before "Generic Pointer Pad" was opened
        assert_eq!(*seen_at_open.borrow(), vec![0, 1, 1]);
        assert_eq!(
            *log.borrow(),
            vec!["Power Button".to_string(), "Another Pad".to_string()]
        );
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let patterns = PriorityPatterns::new(["TrackPad"]);
        assert!(patterns.matches(Some("Apple Inc. Magic Trackpad 2")));
        assert!(!patterns.matches(Some("Logitech Mouse")));
        assert!(!patterns.matches(None));
    }
}
