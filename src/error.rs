//! Error types
//!
//! Every failure a driver can report. All variants are `Copy` and cheap to
//! build so error paths stay bounded inside interrupt context.

use core::fmt;

use crate::types::PhysicalPin;

/// BSP error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Logical pin is not in the board pin map
    InvalidPin(u32),
    /// Compare channel or unit index out of range
    InvalidChannel(usize),
    /// Every slot of the table is claimed
    NoFreeSlot,
    /// Servo handle was never allocated
    InvalidHandle,
    /// Servo min/max pulse bounds are empty after clamping
    InvalidPulseRange,
    /// Physical pin has no analog input
    NotAnalogInput(PhysicalPin),
    /// Resolution outside the supported range
    InvalidResolution(u8),
    /// Operation needs the timer stopped first
    TimerRunning,
    /// ADC did not raise its event within the spin limit
    AdcTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "pin {pin} is not mapped on this board"),
            Self::InvalidChannel(ch) => write!(f, "channel {ch} out of range"),
            Self::NoFreeSlot => write!(f, "no free slot"),
            Self::InvalidHandle => write!(f, "invalid servo handle"),
            Self::InvalidPulseRange => write!(f, "empty pulse range"),
            Self::NotAnalogInput(pin) => write!(f, "{pin:?} has no analog input"),
            Self::InvalidResolution(bits) => write!(f, "unsupported resolution: {bits} bits"),
            Self::TimerRunning => write!(f, "timer is running"),
            Self::AdcTimeout => write!(f, "ADC timeout"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InvalidPin(pin) => defmt::write!(f, "InvalidPin({})", pin),
            Self::InvalidChannel(ch) => defmt::write!(f, "InvalidChannel({})", ch),
            Self::NoFreeSlot => defmt::write!(f, "NoFreeSlot"),
            Self::InvalidHandle => defmt::write!(f, "InvalidHandle"),
            Self::InvalidPulseRange => defmt::write!(f, "InvalidPulseRange"),
            Self::NotAnalogInput(pin) => defmt::write!(f, "NotAnalogInput({})", pin),
            Self::InvalidResolution(bits) => defmt::write!(f, "InvalidResolution({})", bits),
            Self::TimerRunning => defmt::write!(f, "TimerRunning"),
            Self::AdcTimeout => defmt::write!(f, "AdcTimeout"),
        }
    }
}

/// Result type for BSP operations
pub type Result<T> = core::result::Result<T, Error>;
