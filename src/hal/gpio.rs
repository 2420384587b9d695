//! GPIO Abstractions
//!
//! Output-only access to the GPIO ports. Pins are always physical numbers;
//! logical-to-physical translation happens in [`crate::board`].

use crate::types::PhysicalPin;

/// Pin output level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Level {
    /// Driven low
    #[default]
    Low,
    /// Driven high
    High,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Level {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Low => defmt::write!(f, "LOW"),
            Self::High => defmt::write!(f, "HIGH"),
        }
    }
}

/// Register access to the GPIO ports
pub trait GpioRegisters {
    /// PIN_CNF: push-pull output, input buffer disconnected
    fn configure_output(&mut self, pin: PhysicalPin);

    /// OUTSET
    fn set_high(&mut self, pin: PhysicalPin);

    /// OUTCLR
    fn set_low(&mut self, pin: PhysicalPin);

    /// Drive a pin to `level`
    fn set_level(&mut self, pin: PhysicalPin, level: Level) {
        match level {
            Level::High => self.set_high(pin),
            Level::Low => self.set_low(pin),
        }
    }
}
