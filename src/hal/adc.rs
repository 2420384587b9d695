//! ADC Abstractions
//!
//! Task/event view of the nRF51 ADC and the nRF52 SAADC. Both are driven
//! the same way for a single blocking sample: configure, trigger, poll an
//! event, clear it, read the result.

/// ADC task register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcTask {
    /// TASKS_START
    Start,
    /// TASKS_SAMPLE (SAADC only; the nRF51 ADC samples on START)
    Sample,
    /// TASKS_STOP
    Stop,
}

/// ADC event register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcEvent {
    /// EVENTS_STARTED
    Started,
    /// EVENTS_END
    End,
    /// EVENTS_STOPPED
    Stopped,
}

#[cfg(feature = "embedded")]
impl defmt::Format for AdcEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Started => defmt::write!(f, "STARTED"),
            Self::End => defmt::write!(f, "END"),
            Self::Stopped => defmt::write!(f, "STOPPED"),
        }
    }
}

/// Analog input channel AIN0..AIN7
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalogInput(u8);

impl AnalogInput {
    /// Create an analog input, returns None past AIN7
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < crate::config::adc::INPUT_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// AIN index
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AnalogInput {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "AIN{}", self.0);
    }
}

/// Register access to the ADC / SAADC
pub trait AdcRegisters {
    /// ENABLE = 1
    fn enable(&mut self);

    /// ENABLE = 0
    fn disable(&mut self);

    /// Select the input and hardware sample width, single-ended, default
    /// reference and gain
    fn configure(&mut self, input: AnalogInput, bits: u8);

    /// Write 1 to a task register
    fn trigger(&mut self, task: AdcTask);

    /// Event register is set
    fn event(&self, event: AdcEvent) -> bool;

    /// Clear an event register
    fn clear_event(&mut self, event: AdcEvent);

    /// Latest conversion result (signed on SAADC)
    fn result(&self) -> i16;
}
