//! Board pin map
//!
//! Application code names pins by board number; drivers operate on
//! physical GPIOs. A [`PinMap`] does the translation, and every driver
//! that takes a logical pin fails with [`Error::InvalidPin`] when the
//! board has no such pin.

use crate::config::PHYSICAL_PIN_COUNT;
use crate::types::PhysicalPin;
use crate::{Error, Result};

/// Logical-to-physical pin translation
pub trait PinMap {
    /// Physical pin for a board pin number, None if unmapped
    fn physical(&self, pin: u32) -> Option<PhysicalPin>;

    /// Physical pin or [`Error::InvalidPin`]
    fn resolve(&self, pin: u32) -> Result<PhysicalPin> {
        self.physical(pin).ok_or(Error::InvalidPin(pin))
    }
}

/// Table-driven pin map: board pin `n` is `map[n]`
#[derive(Clone, Copy, Debug)]
pub struct BoardPins {
    map: &'static [u8],
}

const fn identity_table() -> [u8; PHYSICAL_PIN_COUNT] {
    let mut table = [0u8; PHYSICAL_PIN_COUNT];
    let mut i = 0;
    while i < PHYSICAL_PIN_COUNT {
        #[allow(clippy::cast_possible_truncation)]
        let gpio = i as u8;
        table[i] = gpio;
        i += 1;
    }
    table
}

const IDENTITY_TABLE: [u8; PHYSICAL_PIN_COUNT] = identity_table();

impl BoardPins {
    /// Board pin `n` is GPIO `n`
    pub const IDENTITY: Self = Self::new(&IDENTITY_TABLE);

    /// Create a pin map from a board table
    #[must_use]
    pub const fn new(map: &'static [u8]) -> Self {
        Self { map }
    }

    /// Number of board pins
    #[must_use]
    pub const fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the board has no pins
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl PinMap for BoardPins {
    fn physical(&self, pin: u32) -> Option<PhysicalPin> {
        let index = usize::try_from(pin).ok()?;
        self.map.get(index).copied().and_then(PhysicalPin::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SPARSE: [u8; 3] = [17, 18, 47];

    #[test]
    fn identity_maps_every_gpio() {
        let pins = BoardPins::IDENTITY;
        assert_eq!(pins.len(), PHYSICAL_PIN_COUNT);
        assert_eq!(pins.physical(0).map(PhysicalPin::number), Some(0));
        assert_eq!(pins.physical(47).map(PhysicalPin::number), Some(47));
        assert_eq!(pins.physical(48), None);
    }

    #[test]
    fn table_translates_and_rejects() {
        let pins = BoardPins::new(&SPARSE);
        assert_eq!(pins.physical(1).map(PhysicalPin::number), Some(18));
        assert_eq!(pins.resolve(3), Err(Error::InvalidPin(3)));
        assert_eq!(pins.resolve(u32::MAX), Err(Error::InvalidPin(u32::MAX)));
    }
}
