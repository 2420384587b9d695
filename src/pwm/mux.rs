//! Timer-multiplexed software PWM

use super::slots::{PwmSlot, PwmSource, SlotTable};
use crate::board::PinMap;
use crate::config::pwm::{self as defaults, CYCLE_CHANNEL, SOURCE_COUNT};
use crate::hal::gpio::GpioRegisters;
use crate::hal::timer::TimerRegisters;
use crate::irq::InterruptHandler;
use crate::types::{BitMode, Prescaler, Priority, Resolution, TimerMode};
use crate::{Error, Result};

/// Output resolution, tick rate and interrupt priorities
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmConfig {
    /// Output resolution; the cycle is `max_value` ticks long
    pub resolution: Resolution,
    /// TIMER prescaler of both sources
    pub prescaler: Prescaler,
    /// NVIC priority per source
    pub priorities: [Priority; SOURCE_COUNT],
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            resolution: defaults::RESOLUTION,
            prescaler: defaults::PRESCALER,
            priorities: defaults::SOURCE_PRIORITIES,
        }
    }
}

/// Software PWM over two TIMER sources
///
/// Each source is programmed lazily on the first write to one of its
/// slots and stopped again when its last slot is released.
pub struct PwmMultiplexer<T, G, P>
where
    T: TimerRegisters,
    G: GpioRegisters,
    P: PinMap,
{
    sources: [T; SOURCE_COUNT],
    running: [bool; SOURCE_COUNT],
    slots: SlotTable,
    gpio: G,
    pins: P,
    config: PwmConfig,
}

impl<T, G, P> PwmMultiplexer<T, G, P>
where
    T: TimerRegisters,
    G: GpioRegisters,
    P: PinMap,
{
    /// Create a multiplexer over two stopped TIMERs
    pub fn new(sources: [T; SOURCE_COUNT], gpio: G, pins: P) -> Self {
        Self::with_config(sources, gpio, pins, PwmConfig::default())
    }

    /// Create a multiplexer with an explicit configuration
    pub fn with_config(sources: [T; SOURCE_COUNT], gpio: G, pins: P, config: PwmConfig) -> Self {
        Self {
            sources,
            running: [false; SOURCE_COUNT],
            slots: SlotTable::new(),
            gpio,
            pins,
            config,
        }
    }

    /// Set the duty of a pin, claiming a slot on first use
    ///
    /// `value` is in output-resolution counts and is clamped to the
    /// resolution maximum: 0 is constant low, the maximum constant high.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPin`] for an unmapped pin, [`Error::NoFreeSlot`]
    /// when all slots belong to other pins.
    pub fn write(&mut self, pin: u32, value: u32) -> Result<()> {
        let phys = self.pins.resolve(pin)?;
        let index = self.slots.find(phys).ok_or(Error::NoFreeSlot)?;
        let value = value.min(self.config.resolution.max_value());

        let slot = self.slots.get_mut(index).ok_or(Error::NoFreeSlot)?;
        let (source, channel) = (slot.source(), slot.channel());
        let newly_claimed = slot.is_free();
        slot.claim(phys);
        slot.set_value(value);

        if !self.running[source.index()] {
            self.start_source(source);
        }
        if newly_claimed {
            self.gpio.configure_output(phys);
            debug!("pwm slot {} claimed by {}", index, phys);
        }

        let timer = &mut self.sources[source.index()];
        timer.set_compare(channel, value);
        timer.enable_interrupt(channel);
        Ok(())
    }

    /// Stop driving a pin and free its slot
    ///
    /// The pin is left low. A source with no remaining slots is stopped.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPin`] if the pin is unmapped or has no slot.
    pub fn release(&mut self, pin: u32) -> Result<()> {
        let phys = self.pins.resolve(pin)?;
        let index = self.slots.position(phys).ok_or(Error::InvalidPin(pin))?;
        let slot = self.slots.get_mut(index).ok_or(Error::InvalidPin(pin))?;
        let (source, channel) = (slot.source(), slot.channel());
        slot.free();

        let timer = &mut self.sources[source.index()];
        timer.disable_interrupt(channel);
        timer.clear_event(channel);
        self.gpio.set_low(phys);
        debug!("pwm slot {} released", index);

        if self.slots.claimed(source).next().is_none() {
            self.stop_source(source);
        }
        Ok(())
    }

    /// Change the output resolution
    ///
    /// Running sources are reprogrammed; stored values above the new
    /// maximum are clamped.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResolution`] outside 1..=16 bits.
    pub fn set_resolution(&mut self, bits: u8) -> Result<()> {
        let resolution = Resolution::new(bits).ok_or(Error::InvalidResolution(bits))?;
        self.config.resolution = resolution;
        let max = resolution.max_value();
        for index in 0..crate::config::pwm::SLOT_COUNT {
            if let Some(slot) = self.slots.get_mut(index) {
                if !slot.is_free() && slot.value() > max {
                    slot.set_value(max);
                }
            }
        }
        self.restart_running();
        Ok(())
    }

    /// Change the tick rate of both sources
    pub fn set_prescaler(&mut self, prescaler: Prescaler) {
        self.config.prescaler = prescaler;
        self.restart_running();
    }

    /// Duty value of a pin, None if it has no slot
    #[must_use]
    pub fn value(&self, pin: u32) -> Option<u32> {
        let phys = self.pins.physical(pin)?;
        let index = self.slots.position(phys)?;
        self.slots.get(index).map(PwmSlot::value)
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> PwmConfig {
        self.config
    }

    /// Slot table
    #[must_use]
    pub const fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Source TIMER is programmed and counting
    #[must_use]
    pub const fn is_running(&self, source: PwmSource) -> bool {
        self.running[source.index()]
    }

    /// Service one source's interrupt
    ///
    /// Phase A runs on CC0, the cycle boundary: every claimed output of the
    /// source goes high (low for a zero duty) and the counter restarts.
    /// Phase B runs per slot whose compare fired: the output goes low
    /// unless the duty is the maximum.
    pub fn on_interrupt(&mut self, source: PwmSource) {
        let max = self.config.resolution.max_value();
        let timer = &mut self.sources[source.index()];

        if timer.event_pending(CYCLE_CHANNEL) {
            for slot in self.slots.claimed(source) {
                if let Some(pin) = slot.pin() {
                    if slot.value() == 0 {
                        self.gpio.set_low(pin);
                    } else {
                        self.gpio.set_high(pin);
                    }
                }
            }
            timer.clear();
            timer.clear_event(CYCLE_CHANNEL);
        }

        for slot in self.slots.claimed(source) {
            let channel = slot.channel();
            if !timer.event_pending(channel) {
                continue;
            }
            if let Some(pin) = slot.pin() {
                if slot.value() != max {
                    self.gpio.set_low(pin);
                }
            }
            timer.clear_event(channel);
        }
    }

    fn start_source(&mut self, source: PwmSource) {
        let config = self.config;
        let max = config.resolution.max_value();
        let timer = &mut self.sources[source.index()];

        timer.disable_irq();
        timer.stop();
        timer.set_mode(TimerMode::Timer);
        timer.set_bit_mode(BitMode::for_resolution(config.resolution.bits()));
        timer.set_prescaler(config.prescaler);
        timer.disable_shorts();

        timer.set_compare(CYCLE_CHANNEL, max);
        timer.clear_event(CYCLE_CHANNEL);
        timer.enable_interrupt(CYCLE_CHANNEL);

        for slot in self.slots.claimed(source) {
            timer.set_compare(slot.channel(), slot.value());
            timer.clear_event(slot.channel());
            timer.enable_interrupt(slot.channel());
        }

        timer.clear();
        timer.enable_irq(config.priorities[source.index()]);
        timer.start();
        self.running[source.index()] = true;
        info!(
            "pwm {} started: {}, {}",
            source, config.resolution, config.prescaler
        );
    }

    fn stop_source(&mut self, source: PwmSource) {
        let timer = &mut self.sources[source.index()];
        timer.disable_irq();
        timer.stop();
        timer.disable_interrupt(CYCLE_CHANNEL);
        self.running[source.index()] = false;
        info!("pwm {} stopped", source);
    }

    fn restart_running(&mut self) {
        for source in PwmSource::ALL {
            if self.running[source.index()] {
                self.start_source(source);
            }
        }
    }
}

impl<T, G, P> InterruptHandler for PwmMultiplexer<T, G, P>
where
    T: TimerRegisters,
    G: GpioRegisters,
    P: PinMap,
{
    type Source = PwmSource;

    fn on_interrupt(&mut self, source: PwmSource) {
        PwmMultiplexer::on_interrupt(self, source);
    }
}
