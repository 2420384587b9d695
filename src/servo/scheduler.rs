//! Servo scheduler: slot allocation across banks

use heapless::Vec;

use super::bank::ServoBank;
use super::slot::ServoSlot;
use crate::board::PinMap;
use crate::config::servo::{MAX_PULSE_WIDTH_US, MAX_SERVOS, MIN_PULSE_WIDTH_US, SERVOS_PER_TIMER};
use crate::hal::gpio::GpioRegisters;
use crate::hal::timer::TimerRegisters;
use crate::irq::InterruptHandler;
use crate::types::PhysicalPin;
use crate::{Error, Result};

/// Index of an allocated servo slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServoHandle(u8);

impl ServoHandle {
    /// Slot index, stable for the life of the scheduler
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bank (TIMER) carrying the slot
    #[must_use]
    pub const fn bank(self) -> usize {
        self.index() / SERVOS_PER_TIMER
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ServoHandle {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "servo#{}", self.0);
    }
}

/// Servo pulse trains on `BANKS` TIMERs
///
/// Slot indices are handed out in order and never reused: detaching a
/// servo only marks its slot inactive, and the same handle can be
/// reattached later. Once every index is taken, further `attach` calls
/// fail with [`Error::NoFreeSlot`] even if some slots are detached.
pub struct ServoScheduler<T, G, P, const BANKS: usize>
where
    T: TimerRegisters,
    G: GpioRegisters,
    P: PinMap,
{
    slots: Vec<ServoSlot, MAX_SERVOS>,
    banks: [ServoBank<T>; BANKS],
    gpio: G,
    pins: P,
}

impl<T, G, P, const BANKS: usize> ServoScheduler<T, G, P, BANKS>
where
    T: TimerRegisters,
    G: GpioRegisters,
    P: PinMap,
{
    /// Create a scheduler with one bank per TIMER
    pub fn new(timers: [T; BANKS], gpio: G, pins: P) -> Self {
        Self {
            slots: Vec::new(),
            banks: timers.map(ServoBank::new),
            gpio,
            pins,
        }
    }

    /// Total slots across all banks
    #[must_use]
    pub const fn capacity(&self) -> usize {
        let banks = BANKS * SERVOS_PER_TIMER;
        if banks < MAX_SERVOS {
            banks
        } else {
            MAX_SERVOS
        }
    }

    /// Slots handed out so far, attached or not
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Attach a servo with the default 544..2400 µs range
    ///
    /// # Errors
    ///
    /// See [`attach`](Self::attach).
    pub fn attach_default(&mut self, pin: u32) -> Result<ServoHandle> {
        self.attach(pin, MIN_PULSE_WIDTH_US, MAX_PULSE_WIDTH_US)
    }

    /// Attach a servo on the next unused slot
    ///
    /// Bounds are clamped to 544..2400 µs. The bank's TIMER is started if
    /// this is its first active servo.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPin`] for an unmapped pin, [`Error::InvalidPulseRange`]
    /// when the clamped bounds are empty, [`Error::NoFreeSlot`] when every
    /// index has been handed out. Existing slots are untouched on error.
    pub fn attach(&mut self, pin: u32, min_us: u16, max_us: u16) -> Result<ServoHandle> {
        let phys = self.pins.resolve(pin)?;
        let (min_us, max_us) = Self::clamp_bounds(min_us, max_us)?;

        let index = self.slots.len();
        if index >= self.capacity() {
            warn!("servo table full ({} slots)", index);
            return Err(Error::NoFreeSlot);
        }
        let handle = ServoHandle(u8::try_from(index).map_err(|_| Error::NoFreeSlot)?);
        self.slots
            .push(ServoSlot::new(phys, min_us, max_us))
            .map_err(|_| Error::NoFreeSlot)?;

        self.activate(handle, phys, min_us, max_us);
        info!("servo {} attached to {}", handle, phys);
        Ok(handle)
    }

    /// Attach a detached handle again, keeping its slot index
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued,
    /// otherwise as [`attach`](Self::attach).
    pub fn reattach(&mut self, handle: ServoHandle, pin: u32, min_us: u16, max_us: u16) -> Result<()> {
        self.slot(handle)?;
        let phys = self.pins.resolve(pin)?;
        let (min_us, max_us) = Self::clamp_bounds(min_us, max_us)?;
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            if slot.is_active() && slot.pin() != phys {
                self.gpio.set_low(slot.pin());
            }
        }
        self.activate(handle, phys, min_us, max_us);
        Ok(())
    }

    /// Stop pulsing a servo and drive its pin low
    ///
    /// The bank's TIMER stops when no active servo remains on it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued.
    pub fn detach(&mut self, handle: ServoHandle) -> Result<()> {
        let slot = self.slot_mut(handle)?;
        slot.deactivate();
        let pin = slot.pin();
        self.gpio.set_low(pin);

        if !self.bank_active(handle.bank()) {
            if let Some(bank) = self.banks.get_mut(handle.bank()) {
                bank.stop();
                info!("servo bank {} stopped", handle.bank());
            }
        }
        Ok(())
    }

    /// Set an angle (values below 544) or a pulse width in microseconds
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued.
    pub fn write(&mut self, handle: ServoHandle, value: i32) -> Result<()> {
        self.slot_mut(handle)?.write(value);
        Ok(())
    }

    /// Set a pulse width in microseconds, clamped to the servo's bounds
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued.
    pub fn write_microseconds(&mut self, handle: ServoHandle, us: i32) -> Result<()> {
        self.slot_mut(handle)?.write_microseconds(us);
        Ok(())
    }

    /// Current angle
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued.
    pub fn read(&self, handle: ServoHandle) -> Result<i32> {
        self.slot(handle).map(ServoSlot::read)
    }

    /// Current pulse width in microseconds
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued.
    pub fn read_microseconds(&self, handle: ServoHandle) -> Result<u16> {
        self.slot(handle).map(ServoSlot::read_microseconds)
    }

    /// Servo is attached
    #[must_use]
    pub fn attached(&self, handle: ServoHandle) -> bool {
        self.slot(handle).is_ok_and(ServoSlot::is_active)
    }

    /// Slot behind a handle
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a handle this scheduler never issued.
    pub fn slot(&self, handle: ServoHandle) -> Result<&ServoSlot> {
        self.slots.get(handle.index()).ok_or(Error::InvalidHandle)
    }

    /// Bank by index
    #[must_use]
    pub fn bank(&self, bank: usize) -> Option<&ServoBank<T>> {
        self.banks.get(bank)
    }

    /// Service the compare interrupt of one bank
    pub fn on_interrupt(&mut self, bank: usize) {
        let Some(timer) = self.banks.get_mut(bank) else {
            return;
        };
        let start = bank * SERVOS_PER_TIMER;
        let end = (start + SERVOS_PER_TIMER).min(self.slots.len());
        let slots = self.slots.get(start..end).unwrap_or(&[]);
        timer.on_compare(slots, &mut self.gpio);
    }

    fn clamp_bounds(min_us: u16, max_us: u16) -> Result<(u16, u16)> {
        let min_us = min_us.max(MIN_PULSE_WIDTH_US);
        let max_us = max_us.min(MAX_PULSE_WIDTH_US);
        if min_us < max_us {
            Ok((min_us, max_us))
        } else {
            Err(Error::InvalidPulseRange)
        }
    }

    fn activate(&mut self, handle: ServoHandle, pin: PhysicalPin, min_us: u16, max_us: u16) {
        self.gpio.configure_output(pin);
        let bank = handle.bank();
        if !self.bank_active(bank) {
            if let Some(b) = self.banks.get_mut(bank) {
                b.start();
                info!("servo bank {} started", bank);
            }
        }
        // Only after the bank check, so the first servo starts the TIMER
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            slot.activate(pin, min_us, max_us);
        }
    }

    fn bank_active(&self, bank: usize) -> bool {
        let start = bank * SERVOS_PER_TIMER;
        self.slots
            .iter()
            .skip(start)
            .take(SERVOS_PER_TIMER)
            .any(ServoSlot::is_active)
    }

    fn slot_mut(&mut self, handle: ServoHandle) -> Result<&mut ServoSlot> {
        self.slots
            .get_mut(handle.index())
            .ok_or(Error::InvalidHandle)
    }
}

impl<T, G, P, const BANKS: usize> InterruptHandler for ServoScheduler<T, G, P, BANKS>
where
    T: TimerRegisters,
    G: GpioRegisters,
    P: PinMap,
{
    type Source = usize;

    fn on_interrupt(&mut self, bank: usize) {
        ServoScheduler::on_interrupt(self, bank);
    }
}
