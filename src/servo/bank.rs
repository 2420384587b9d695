//! One servo bank: a TIMER plus the pulse state machine

use super::slot::ServoSlot;
use crate::config::servo::{
    BIT_MODE, CC_REG, OVERRUN_MARGIN_TICKS, PRESCALER, PRIORITY, REFRESH_MARGIN_TICKS,
    REFRESH_TICKS, SERVOS_PER_TIMER,
};
use crate::hal::gpio::GpioRegisters;
use crate::hal::timer::TimerRegisters;
use crate::types::TimerMode;

/// Position of a bank's scan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Waiting for the refresh period to end
    #[default]
    RefreshGap,
    /// Slot `i` of the bank is mid-pulse
    Slot(usize),
}

#[cfg(feature = "embedded")]
impl defmt::Format for Cursor {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::RefreshGap => defmt::write!(f, "gap"),
            Self::Slot(i) => defmt::write!(f, "slot{}", i),
        }
    }
}

/// TIMER driving up to twelve servos
pub struct ServoBank<T: TimerRegisters> {
    timer: T,
    cursor: Cursor,
    running: bool,
}

impl<T: TimerRegisters> ServoBank<T> {
    /// Wrap a stopped TIMER
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            cursor: Cursor::RefreshGap,
            running: false,
        }
    }

    /// Program the TIMER and start the pulse train
    ///
    /// The first compare fires one refresh period after start and begins
    /// the scan at slot 0.
    pub fn start(&mut self) {
        let t = &mut self.timer;
        t.disable_irq();
        t.stop();
        t.set_mode(TimerMode::Timer);
        t.set_bit_mode(BIT_MODE);
        t.set_prescaler(PRESCALER);
        t.disable_shorts();
        t.clear();
        t.clear_event(CC_REG);
        t.set_compare(CC_REG, REFRESH_TICKS);
        t.enable_interrupt(CC_REG);
        t.enable_irq(PRIORITY);
        t.start();

        self.cursor = Cursor::RefreshGap;
        self.running = true;
    }

    /// Stop the TIMER
    pub fn stop(&mut self) {
        self.timer.stop();
        self.timer.disable_irq();
        self.running = false;
    }

    /// TIMER is counting
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Current scan position
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Advance the state machine on a compare match
    ///
    /// `slots` are the allocated slots of this bank, in index order.
    pub fn on_compare<G: GpioRegisters>(&mut self, slots: &[ServoSlot], gpio: &mut G) {
        let mask = BIT_MODE.mask();
        let t = &mut self.timer;
        t.clear_event(CC_REG);

        let next = match self.cursor {
            Cursor::RefreshGap => {
                t.clear();
                t.set_compare(CC_REG, 0);
                0
            }
            Cursor::Slot(i) => {
                if let Some(slot) = slots.get(i).filter(|s| s.is_active()) {
                    gpio.set_low(slot.pin());
                }
                i + 1
            }
        };

        match slots.get(next).filter(|_| next < SERVOS_PER_TIMER) {
            Some(slot) => {
                if slot.is_active() {
                    gpio.set_high(slot.pin());
                }
                let cc = t.compare(CC_REG).wrapping_add(slot.period_ticks()) & mask;
                t.set_compare(CC_REG, cc);
                self.cursor = Cursor::Slot(next);
            }
            None => {
                let cc = t.compare(CC_REG);
                let deadline = if cc + OVERRUN_MARGIN_TICKS < REFRESH_TICKS {
                    REFRESH_TICKS + REFRESH_MARGIN_TICKS
                } else {
                    cc + OVERRUN_MARGIN_TICKS
                };
                t.set_compare(CC_REG, deadline & mask);
                self.cursor = Cursor::RefreshGap;
            }
        }
    }
}
