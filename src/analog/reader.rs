//! Blocking analog reads

use super::input::{AdcFamily, SpinLimit};
use crate::board::PinMap;
use crate::config::adc::READ_RESOLUTION;
use crate::hal::adc::{AdcEvent, AdcRegisters, AdcTask};
use crate::types::{map_resolution, Resolution};
use crate::{Error, Result};

/// Single-sample reader over the chip's ADC
pub struct AnalogReader<A: AdcRegisters, P: PinMap> {
    adc: A,
    pins: P,
    family: AdcFamily,
    resolution: Resolution,
    spin_limit: SpinLimit,
}

impl<A: AdcRegisters, P: PinMap> AnalogReader<A, P> {
    /// Create a reader at the default 10-bit resolution, waiting forever
    pub fn new(adc: A, pins: P, family: AdcFamily) -> Self {
        Self {
            adc,
            pins,
            family,
            resolution: READ_RESOLUTION,
            spin_limit: SpinLimit::Unbounded,
        }
    }

    /// Bound every event wait
    #[must_use]
    pub fn with_spin_limit(mut self, spin_limit: SpinLimit) -> Self {
        self.spin_limit = spin_limit;
        self
    }

    /// Set the width of values returned by [`read`](Self::read)
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResolution`] outside 1..=16 bits.
    pub fn set_read_resolution(&mut self, bits: u8) -> Result<()> {
        self.resolution = Resolution::new(bits).ok_or(Error::InvalidResolution(bits))?;
        Ok(())
    }

    /// Current read resolution
    #[must_use]
    pub const fn read_resolution(&self) -> Resolution {
        self.resolution
    }

    /// Convert one sample from a board pin
    ///
    /// Negative SAADC results read as 0. The ADC is disabled again on
    /// return, including on timeout.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPin`] for an unmapped pin, [`Error::NotAnalogInput`]
    /// for a GPIO with no AIN, [`Error::AdcTimeout`] when an event does not
    /// arrive within the spin limit.
    pub fn read(&mut self, pin: u32) -> Result<u32> {
        let phys = self.pins.resolve(pin)?;
        let input = self
            .family
            .analog_input(phys)
            .ok_or(Error::NotAnalogInput(phys))?;
        let requested = self.resolution.bits();
        let hw_bits = self.family.hardware_bits(requested);

        self.adc.configure(input, hw_bits);
        self.adc.enable();

        let sample = if self.family.has_easydma() {
            self.sample_saadc()
        } else {
            self.sample_adc()
        };
        self.adc.disable();

        let raw = sample?.max(0).unsigned_abs();
        Ok(map_resolution(u32::from(raw), hw_bits, requested))
    }

    fn sample_adc(&mut self) -> Result<i16> {
        self.adc.trigger(AdcTask::Start);
        self.await_event(AdcEvent::End)?;
        let value = self.adc.result();
        self.adc.trigger(AdcTask::Stop);
        Ok(value)
    }

    fn sample_saadc(&mut self) -> Result<i16> {
        self.adc.trigger(AdcTask::Start);
        self.await_event(AdcEvent::Started)?;
        self.adc.trigger(AdcTask::Sample);
        self.await_event(AdcEvent::End)?;
        let value = self.adc.result();
        self.adc.trigger(AdcTask::Stop);
        self.await_event(AdcEvent::Stopped)?;
        Ok(value)
    }

    fn await_event(&mut self, event: AdcEvent) -> Result<()> {
        let adc = &self.adc;
        if self.spin_limit.wait(|| adc.event(event)) {
            self.adc.clear_event(event);
            Ok(())
        } else {
            warn!("ADC timeout waiting for {}", event);
            self.adc.trigger(AdcTask::Stop);
            Err(Error::AdcTimeout)
        }
    }
}
