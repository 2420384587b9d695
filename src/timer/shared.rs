//! Shared timer driver

use super::registry::{CompareCallback, CompareSlot, SlotRegistry};
use crate::config::shared_timer;
use crate::hal::timer::{TimerConfig, TimerRegisters};
use crate::irq::InterruptHandler;
use crate::types::{ChannelMask, Priority};
use crate::{Error, Result};

/// A TIMER whose compare channels drive independent periodic callbacks
pub struct SharedTimer<T: TimerRegisters, const N: usize = { shared_timer::SLOT_COUNT }> {
    timer: T,
    registry: SlotRegistry<N>,
    config: TimerConfig,
    priority: Priority,
    running: bool,
}

impl<T: TimerRegisters, const N: usize> SharedTimer<T, N> {
    /// Wrap a stopped TIMER with the default configuration
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            registry: SlotRegistry::new(),
            config: TimerConfig::default(),
            priority: shared_timer::PRIORITY,
            running: false,
        }
    }

    /// Use a different NVIC priority for the next start
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set mode, counter width and prescaler for the next start
    ///
    /// # Errors
    ///
    /// [`Error::TimerRunning`] while the timer runs.
    pub fn configure(&mut self, config: TimerConfig) -> Result<()> {
        self.ensure_stopped()?;
        self.config = config;
        Ok(())
    }

    /// Register a periodic callback on a compare channel
    ///
    /// The first match happens `reload` ticks after start, then every
    /// `reload` ticks.
    ///
    /// # Errors
    ///
    /// [`Error::TimerRunning`] while the timer runs, [`Error::InvalidChannel`]
    /// for a channel the table or the TIMER instance does not have.
    pub fn configure_channel(
        &mut self,
        channel: usize,
        reload: u32,
        callback: CompareCallback,
    ) -> Result<()> {
        self.ensure_stopped()?;
        self.check_channel(channel)?;
        self.registry.register(channel, reload, callback)
    }

    /// Free a compare channel
    ///
    /// # Errors
    ///
    /// Same as [`configure_channel`](Self::configure_channel).
    pub fn release_channel(&mut self, channel: usize) -> Result<()> {
        self.ensure_stopped()?;
        self.check_channel(channel)?;
        self.registry.release(channel)
    }

    /// Reset the counter, arm every registered channel and start counting
    ///
    /// # Errors
    ///
    /// [`Error::TimerRunning`] if already started.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_stopped()?;

        // Nothing may be dispatched against a half-written configuration
        self.timer.disable_irq();
        self.timer.configure(&self.config);
        self.timer.disable_shorts();
        self.timer.clear();

        let mask = self.config.bit_mode.mask();
        let channels = self.channels();
        for (channel, slot) in self.registry.iter().take(channels) {
            self.timer.clear_event(channel);
            if slot.is_registered() {
                self.timer.set_compare(channel, slot.reload() & mask);
                self.timer.enable_interrupt(channel);
            } else {
                self.timer.disable_interrupt(channel);
            }
        }

        self.timer.enable_irq(self.priority);
        self.timer.start();
        self.running = true;
        info!("shared timer started: {}", self.config);
        Ok(())
    }

    /// Stop counting and mask the interrupt line
    pub fn stop(&mut self) {
        self.timer.disable_irq();
        self.timer.stop();
        self.running = false;
        info!("shared timer stopped");
    }

    /// Timer is counting
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> TimerConfig {
        self.config
    }

    /// Registration of a channel
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] when out of range.
    pub fn slot(&self, channel: usize) -> Result<&CompareSlot> {
        self.registry.get(channel)
    }

    /// Service every pending compare match
    ///
    /// Channels are handled in ascending order. For each one whose event
    /// and interrupt enable are both set: clear the event, move the compare
    /// value forward by the reload, then run the callback.
    pub fn on_interrupt(&mut self) -> ChannelMask {
        let mask = self.config.bit_mode.mask();
        let mut serviced = ChannelMask::EMPTY;

        for channel in 0..self.channels() {
            if !(self.timer.event_pending(channel) && self.timer.interrupt_enabled(channel)) {
                continue;
            }
            self.timer.clear_event(channel);

            let Ok(slot) = self.registry.get(channel) else {
                continue;
            };
            let next = self.timer.compare(channel).wrapping_add(slot.reload()) & mask;
            self.timer.set_compare(channel, next);
            if let Some(callback) = slot.callback() {
                callback(channel);
            }
            serviced = serviced.with(channel);
        }

        serviced
    }

    fn channels(&self) -> usize {
        N.min(self.timer.channel_count())
    }

    fn check_channel(&self, channel: usize) -> Result<()> {
        if channel < self.channels() {
            Ok(())
        } else {
            Err(Error::InvalidChannel(channel))
        }
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.running {
            Err(Error::TimerRunning)
        } else {
            Ok(())
        }
    }
}

impl<T: TimerRegisters, const N: usize> InterruptHandler for SharedTimer<T, N> {
    type Source = ();

    fn on_interrupt(&mut self, (): ()) {
        SharedTimer::on_interrupt(self);
    }
}
