//! PWM Abstractions
//!
//! One nRF52 hardware PWM unit: a 15-bit up-counter, a ÷1..÷128 clock
//! divider, four output channels and a one-entry-per-channel sequence in
//! RAM whose top bit selects the output polarity.

use crate::config::hw_pwm::CHANNELS_PER_UNIT;
use crate::types::PhysicalPin;

/// Duty words for all channels of a unit, loaded as one sequence
pub type PwmSequence = [u16; CHANNELS_PER_UNIT];

/// Register access to one hardware PWM unit
pub trait PwmRegisters {
    /// ENABLE = 1
    fn enable(&mut self);

    /// ENABLE = 0
    fn disable(&mut self);

    /// Up-counting mode, PRESCALER = `divider_log2`, COUNTERTOP = `top`,
    /// individual decoder, no looping
    fn configure(&mut self, divider_log2: u8, top: u16);

    /// PSEL.OUT\[channel\]; `None` disconnects the channel
    fn connect(&mut self, channel: usize, pin: Option<PhysicalPin>);

    /// Point SEQ\[0\] at `sequence` and trigger SEQSTART\[0\]
    fn load_sequence(&mut self, sequence: &PwmSequence);
}
