//! Analog input tables and wait bounds

use crate::config::adc::INPUT_COUNT;
use crate::hal::adc::AnalogInput;
use crate::types::PhysicalPin;

/// Which converter the chip has
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcFamily {
    /// nRF51 10-bit ADC
    Nrf51Adc,
    /// nRF52 SAADC
    Nrf52Saadc,
}

/// GPIO behind AIN0..AIN7
const NRF51_AIN_PINS: [u8; INPUT_COUNT] = [26, 27, 1, 2, 3, 4, 5, 6];
const NRF52_AIN_PINS: [u8; INPUT_COUNT] = [2, 3, 4, 5, 28, 29, 30, 31];

impl AdcFamily {
    /// Analog input wired to a GPIO, None for digital-only pins
    #[must_use]
    pub fn analog_input(self, pin: PhysicalPin) -> Option<AnalogInput> {
        let table = match self {
            Self::Nrf51Adc => &NRF51_AIN_PINS,
            Self::Nrf52Saadc => &NRF52_AIN_PINS,
        };
        let index = table.iter().position(|&p| p == pin.number())?;
        AnalogInput::new(u8::try_from(index).ok()?)
    }

    /// Hardware sample width used for a requested read resolution
    ///
    /// The smallest supported width at or above the request, or the widest
    /// one when the request exceeds it.
    #[must_use]
    pub const fn hardware_bits(self, requested: u8) -> u8 {
        match self {
            Self::Nrf51Adc => match requested {
                0..=8 => 8,
                9 => 9,
                _ => 10,
            },
            Self::Nrf52Saadc => match requested {
                0..=8 => 8,
                9..=10 => 10,
                11..=12 => 12,
                _ => 14,
            },
        }
    }

    /// The SAADC needs START/STARTED and STOP/STOPPED around a sample
    #[must_use]
    pub const fn has_easydma(self) -> bool {
        matches!(self, Self::Nrf52Saadc)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AdcFamily {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Nrf51Adc => defmt::write!(f, "ADC"),
            Self::Nrf52Saadc => defmt::write!(f, "SAADC"),
        }
    }
}

/// Bound on each busy-wait for an ADC event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpinLimit {
    /// Wait forever
    #[default]
    Unbounded,
    /// Give up after this many polls
    Bounded(u32),
}

impl SpinLimit {
    /// Poll `ready` until it returns true or the limit runs out
    pub fn wait(self, mut ready: impl FnMut() -> bool) -> bool {
        match self {
            Self::Unbounded => {
                while !ready() {
                    core::hint::spin_loop();
                }
                true
            }
            Self::Bounded(polls) => (0..polls).any(|_| ready()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_wait_gives_up() {
        let mut polls = 0;
        assert!(!SpinLimit::Bounded(5).wait(|| {
            polls += 1;
            false
        }));
        assert_eq!(polls, 5);
    }

    #[test]
    fn wait_stops_at_first_ready() {
        let mut polls = 0;
        assert!(SpinLimit::Unbounded.wait(|| {
            polls += 1;
            polls == 3
        }));
        assert_eq!(polls, 3);
    }
}
