//! PWM slot table

use crate::config::pwm::{SLOTS_PER_SOURCE, SLOT_COUNT, SOURCE_COUNT};
use crate::types::PhysicalPin;

/// One of the two TIMER sources behind the multiplexer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmSource {
    /// Source for slots 0..3
    First,
    /// Source for slots 3..6
    Second,
}

impl PwmSource {
    /// All sources in slot order
    pub const ALL: [Self; SOURCE_COUNT] = [Self::First, Self::Second];

    /// Position in source arrays
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    const fn for_slot(slot: usize) -> Self {
        if slot < SLOTS_PER_SOURCE {
            Self::First
        } else {
            Self::Second
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PwmSource {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "source{}", self.index());
    }
}

/// A PWM output claim on one compare channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmSlot {
    pin: Option<PhysicalPin>,
    value: u32,
    channel: usize,
    source: PwmSource,
}

impl PwmSlot {
    const fn unclaimed(index: usize) -> Self {
        Self {
            pin: None,
            value: 0,
            // CC0 is the cycle boundary of every source
            channel: index % SLOTS_PER_SOURCE + 1,
            source: PwmSource::for_slot(index),
        }
    }

    /// Pin driven by this slot, None if free
    #[must_use]
    pub const fn pin(&self) -> Option<PhysicalPin> {
        self.pin
    }

    /// Duty value in output-resolution counts
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Compare channel carrying the falling edge
    #[must_use]
    pub const fn channel(&self) -> usize {
        self.channel
    }

    /// TIMER source
    #[must_use]
    pub const fn source(&self) -> PwmSource {
        self.source
    }

    /// Slot has no pin
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.pin.is_none()
    }

    pub(super) fn claim(&mut self, pin: PhysicalPin) {
        self.pin = Some(pin);
    }

    pub(super) fn set_value(&mut self, value: u32) {
        self.value = value;
    }

    pub(super) fn free(&mut self) {
        self.pin = None;
        self.value = 0;
    }
}

/// Fixed table of PWM slots, three per source
#[derive(Clone, Debug)]
pub struct SlotTable {
    slots: [PwmSlot; SLOT_COUNT],
}

impl SlotTable {
    /// Create a table with every slot free
    #[must_use]
    pub const fn new() -> Self {
        let mut slots = [PwmSlot::unclaimed(0); SLOT_COUNT];
        let mut i = 1;
        while i < SLOT_COUNT {
            slots[i] = PwmSlot::unclaimed(i);
            i += 1;
        }
        Self { slots }
    }

    /// Slot already driving `pin`, else the first free slot
    #[must_use]
    pub fn find(&self, pin: PhysicalPin) -> Option<usize> {
        self.position(pin)
            .or_else(|| self.slots.iter().position(PwmSlot::is_free))
    }

    /// Slot driving `pin`
    #[must_use]
    pub fn position(&self, pin: PhysicalPin) -> Option<usize> {
        self.slots.iter().position(|s| s.pin == Some(pin))
    }

    /// Slot by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PwmSlot> {
        self.slots.get(index)
    }

    pub(super) fn get_mut(&mut self, index: usize) -> Option<&mut PwmSlot> {
        self.slots.get_mut(index)
    }

    /// Claimed slots belonging to a source
    pub fn claimed(&self, source: PwmSource) -> impl Iterator<Item = &PwmSlot> {
        self.slots
            .iter()
            .filter(move |s| s.source == source && !s.is_free())
    }

    /// Number of claimed slots
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_free()).count()
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}
