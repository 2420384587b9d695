//! nRF52 hardware PWM units

use crate::board::PinMap;
use crate::config::hw_pwm::{
    CHANNELS_PER_UNIT, DEFAULT_FREQUENCY_HZ, MAX_TOP, MIN_FREQUENCY_HZ, POLARITY_RISING,
    UNIT_COUNT,
};
use crate::config::PERIPHERAL_CLOCK_HZ;
use crate::hal::pwm::{PwmRegisters, PwmSequence};
use crate::types::{PhysicalPin, Resolution};
use crate::{Error, Result};

/// Clock divider and counter top for a requested frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmTiming {
    /// PRESCALER: the counter runs at 16 MHz >> divider_log2
    pub divider_log2: u8,
    /// COUNTERTOP
    pub top: u16,
    /// Frequency actually produced after clamping
    pub frequency_hz: u32,
}

impl PwmTiming {
    /// Pick the divider band for `frequency_hz`
    ///
    /// Above 512 Hz the counter runs undivided and the frequency is capped
    /// so that one duty step is at least one clock. Below that each octave
    /// gets its own divider, down to ÷128 with a 4 Hz floor.
    #[must_use]
    pub fn for_frequency(frequency_hz: u32, resolution: Resolution) -> Self {
        let (frequency_hz, divider_log2) = match frequency_hz {
            f if f > 512 => (f.min(PERIPHERAL_CLOCK_HZ / resolution.max_value()), 0),
            f if f > 256 => (f, 1),
            f if f > 128 => (f, 2),
            f if f > 64 => (f, 3),
            f if f > 32 => (f, 4),
            f if f > 16 => (f, 5),
            f if f > 8 => (f, 6),
            f => (f.max(MIN_FREQUENCY_HZ), 7),
        };
        let counter_hz = PERIPHERAL_CLOCK_HZ >> divider_log2;
        let mut top = counter_hz / frequency_hz;
        let mut frequency_hz = frequency_hz;
        if top > MAX_TOP {
            // Capped top runs faster than asked
            top = MAX_TOP;
            frequency_hz = counter_hz / top;
        }
        Self {
            divider_log2,
            top: u16::try_from(top).unwrap_or(u16::MAX),
            frequency_hz,
        }
    }

    /// Sequence word for `value` out of `resolution`
    ///
    /// Scaled to the counter top, capped at the top, with the polarity bit
    /// set so the output is high for the first part of the period.
    #[must_use]
    pub fn duty(&self, value: u32, resolution: Resolution) -> u16 {
        let top = u32::from(self.top);
        let max = resolution.max_value();
        let compare = (top * value.min(max) / max).min(top);
        u16::try_from(compare).unwrap_or(self.top) | POLARITY_RISING
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct UnitState {
    requested_hz: u32,
    timing: Option<PwmTiming>,
    pins: [Option<PhysicalPin>; CHANNELS_PER_UNIT],
    sequence: PwmSequence,
}

/// Up to three PWM units with four outputs each
pub struct HardwarePwm<R: PwmRegisters, P: PinMap, const N: usize = UNIT_COUNT> {
    units: [R; N],
    state: [UnitState; N],
    pins: P,
    resolution: Resolution,
}

impl<R: PwmRegisters, P: PinMap, const N: usize> HardwarePwm<R, P, N> {
    /// Wrap the first `N` PWM units, all unconfigured
    pub fn new(units: [R; N], pins: P) -> Self {
        Self {
            units,
            state: [UnitState::default(); N],
            pins,
            resolution: crate::config::pwm::RESOLUTION,
        }
    }

    /// Set the resolution of values passed to [`write`](Self::write)
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResolution`] outside 1..=16 bits.
    pub fn set_resolution(&mut self, bits: u8) -> Result<()> {
        self.resolution = Resolution::new(bits).ok_or(Error::InvalidResolution(bits))?;
        Ok(())
    }

    /// Program a unit for `frequency_hz`; no-op if already at that frequency
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] for a unit this driver does not own.
    pub fn init(&mut self, unit: usize, frequency_hz: u32) -> Result<()> {
        let state = self.state.get_mut(unit).ok_or(Error::InvalidChannel(unit))?;
        if state.timing.is_some() && state.requested_hz == frequency_hz {
            return Ok(());
        }

        let timing = PwmTiming::for_frequency(frequency_hz, self.resolution);
        state.requested_hz = frequency_hz;
        state.timing = Some(timing);

        let regs = &mut self.units[unit];
        regs.configure(timing.divider_log2, timing.top);
        regs.enable();
        regs.load_sequence(&state.sequence);
        info!(
            "PWM{} at {} Hz (div 2^{}, top {})",
            unit, timing.frequency_hz, timing.divider_log2, timing.top
        );
        Ok(())
    }

    /// Disable a unit and forget its frequency
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] for a unit this driver does not own.
    pub fn deinit(&mut self, unit: usize) -> Result<()> {
        let state = self.state.get_mut(unit).ok_or(Error::InvalidChannel(unit))?;
        state.timing = None;
        state.requested_hz = 0;
        self.units[unit].disable();
        info!("PWM{} disabled", unit);
        Ok(())
    }

    /// Write a duty on PWM0, configuring it at 500 Hz on first use
    ///
    /// # Errors
    ///
    /// See [`write_on`](Self::write_on).
    pub fn write(&mut self, pin: u32, value: u32) -> Result<()> {
        self.write_on(pin, value, 0)
    }

    /// Write a duty on a given unit
    ///
    /// The pin takes the channel it already has on that unit, else the
    /// first unconnected channel.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPin`] for an unmapped pin, [`Error::InvalidChannel`]
    /// for a unit this driver does not own, [`Error::NoFreeSlot`] when all four channels
    /// drive other pins.
    pub fn write_on(&mut self, pin: u32, value: u32, unit: usize) -> Result<()> {
        let phys = self.pins.resolve(pin)?;
        if unit >= N {
            return Err(Error::InvalidChannel(unit));
        }
        if self.state[unit].timing.is_none() {
            self.init(unit, DEFAULT_FREQUENCY_HZ)?;
        }

        let resolution = self.resolution;
        let state = &mut self.state[unit];
        let channel = state
            .pins
            .iter()
            .position(|p| *p == Some(phys))
            .or_else(|| state.pins.iter().position(Option::is_none))
            .ok_or(Error::NoFreeSlot)?;
        let timing = state.timing.ok_or(Error::InvalidChannel(unit))?;

        let regs = &mut self.units[unit];
        if state.pins[channel].is_none() {
            state.pins[channel] = Some(phys);
            regs.connect(channel, Some(phys));
        }
        state.sequence[channel] = timing.duty(value, resolution);
        regs.load_sequence(&state.sequence);
        Ok(())
    }

    /// Frequency a unit is running at, None if unconfigured
    #[must_use]
    pub fn frequency(&self, unit: usize) -> Option<u32> {
        self.state
            .get(unit)
            .and_then(|s| s.timing)
            .map(|t| t.frequency_hz)
    }
}
