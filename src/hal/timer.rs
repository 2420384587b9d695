//! Timer Abstractions
//!
//! The subset of an nRF5 TIMER instance the drivers use: the three tasks,
//! mode/width/prescaler configuration, the CC registers with their
//! COMPARE events and interrupt enables, and the NVIC line.

use crate::types::{BitMode, Prescaler, Priority, TimerMode};

/// Static TIMER configuration applied before START
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    /// Timer or counter mode
    pub mode: TimerMode,
    /// Counter width
    pub bit_mode: BitMode,
    /// Tick prescaler
    pub prescaler: Prescaler,
}

impl TimerConfig {
    /// Create a timer configuration
    #[must_use]
    pub const fn new(mode: TimerMode, bit_mode: BitMode, prescaler: Prescaler) -> Self {
        Self {
            mode,
            bit_mode,
            prescaler,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        use crate::config::shared_timer;
        Self::new(shared_timer::MODE, shared_timer::BIT_MODE, shared_timer::PRESCALER)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimerConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "TimerConfig({}, {}, {})",
            self.mode,
            self.bit_mode,
            self.prescaler
        );
    }
}

/// Register access to one TIMER instance
///
/// Channel indices passed to these methods are always below
/// [`channel_count`](Self::channel_count); drivers check before calling.
pub trait TimerRegisters {
    /// Number of CC registers on this instance (4 or 6)
    fn channel_count(&self) -> usize;

    /// TASKS_START
    fn start(&mut self);

    /// TASKS_STOP
    fn stop(&mut self);

    /// TASKS_CLEAR: counter back to zero
    fn clear(&mut self);

    /// MODE register
    fn set_mode(&mut self, mode: TimerMode);

    /// BITMODE register
    fn set_bit_mode(&mut self, bit_mode: BitMode);

    /// PRESCALER register
    fn set_prescaler(&mut self, prescaler: Prescaler);

    /// Clear every SHORTS entry
    fn disable_shorts(&mut self);

    /// Read CC\[channel\]
    fn compare(&self, channel: usize) -> u32;

    /// Write CC\[channel\]
    fn set_compare(&mut self, channel: usize, value: u32);

    /// EVENTS_COMPARE\[channel\] is set
    fn event_pending(&self, channel: usize) -> bool;

    /// Clear EVENTS_COMPARE\[channel\]
    fn clear_event(&mut self, channel: usize);

    /// INTENSET for COMPARE\[channel\]
    fn enable_interrupt(&mut self, channel: usize);

    /// INTENCLR for COMPARE\[channel\]
    fn disable_interrupt(&mut self, channel: usize);

    /// INTEN bit for COMPARE\[channel\]
    fn interrupt_enabled(&self, channel: usize) -> bool;

    /// Mask the TIMER line in the NVIC
    fn disable_irq(&mut self);

    /// Clear pending, set priority and unmask the TIMER line in the NVIC
    fn enable_irq(&mut self, priority: Priority);

    /// Apply mode, width and prescaler in one go
    fn configure(&mut self, config: &TimerConfig) {
        self.set_mode(config.mode);
        self.set_bit_mode(config.bit_mode);
        self.set_prescaler(config.prescaler);
    }
}
