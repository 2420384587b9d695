//! Servo slot and pulse-width conversions

use crate::config::servo::{
    DEFAULT_PULSE_WIDTH_US, MAX_ANGLE, MIN_PULSE_WIDTH_US, TIMER_HZ, TRIM_SHIFT,
};
use crate::types::PhysicalPin;

const TICKS_PER_US: u32 = TIMER_HZ / 1_000_000;

/// Microseconds to servo timer ticks
#[must_use]
pub const fn us_to_ticks(us: u32) -> u32 {
    TICKS_PER_US * us
}

/// Servo timer ticks to microseconds
#[must_use]
pub const fn ticks_to_us(ticks: u32) -> u32 {
    ticks / TICKS_PER_US
}

/// Linear re-mapping of `x` from one range to another, truncating
///
/// An empty input range maps everything to `out_min`.
#[must_use]
pub const fn map(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_min == in_max {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// One attached (or detached) servo
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServoSlot {
    pin: PhysicalPin,
    active: bool,
    ticks: u32,
    min_us: u16,
    max_us: u16,
}

impl ServoSlot {
    /// Inactive slot at the default pulse width
    #[must_use]
    pub const fn new(pin: PhysicalPin, min_us: u16, max_us: u16) -> Self {
        Self {
            pin,
            active: false,
            ticks: us_to_ticks(DEFAULT_PULSE_WIDTH_US as u32),
            min_us,
            max_us,
        }
    }

    /// Output pin
    #[must_use]
    pub const fn pin(&self) -> PhysicalPin {
        self.pin
    }

    /// Slot takes part in the pulse train
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Pulse width in ticks
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Pulse width bounds in microseconds
    #[must_use]
    pub const fn bounds(&self) -> (u16, u16) {
        (self.min_us, self.max_us)
    }

    /// Ticks the compare deadline advances for this slot, trim included
    #[must_use]
    pub const fn period_ticks(&self) -> u32 {
        self.ticks + (self.ticks >> TRIM_SHIFT)
    }

    /// Set the pulse from an angle (below the minimum pulse width) or a
    /// pulse width in microseconds
    pub fn write(&mut self, value: i32) {
        let value = if value < i32::from(MIN_PULSE_WIDTH_US) {
            map(
                value.clamp(0, MAX_ANGLE),
                0,
                MAX_ANGLE,
                i32::from(self.min_us),
                i32::from(self.max_us),
            )
        } else {
            value
        };
        self.write_microseconds(value);
    }

    /// Set the pulse width, clamped to the slot bounds
    pub fn write_microseconds(&mut self, us: i32) {
        let us = us.clamp(i32::from(self.min_us), i32::from(self.max_us));
        self.ticks = us_to_ticks(us.unsigned_abs());
    }

    /// Pulse width as an angle in 0..=180
    #[must_use]
    pub fn read(&self) -> i32 {
        map(
            i32::from(self.read_microseconds()) + 1,
            i32::from(self.min_us),
            i32::from(self.max_us),
            0,
            MAX_ANGLE,
        )
    }

    /// Pulse width in microseconds
    #[must_use]
    pub fn read_microseconds(&self) -> u16 {
        u16::try_from(ticks_to_us(self.ticks)).unwrap_or(u16::MAX)
    }

    pub(super) fn activate(&mut self, pin: PhysicalPin, min_us: u16, max_us: u16) {
        self.pin = pin;
        self.min_us = min_us;
        self.max_us = max_us;
        self.active = true;
    }

    pub(super) fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> ServoSlot {
        ServoSlot::new(PhysicalPin::new(3).unwrap(), 544, 2400)
    }

    #[test]
    fn default_pulse_is_centered() {
        assert_eq!(slot().ticks(), 3000);
        assert_eq!(slot().read_microseconds(), 1500);
    }

    #[test]
    fn angles_and_widths_share_one_entry_point() {
        let mut s = slot();
        s.write(0);
        assert_eq!(s.read_microseconds(), 544);
        s.write(180);
        assert_eq!(s.read_microseconds(), 2400);
        s.write(-20);
        assert_eq!(s.read_microseconds(), 544);
        s.write(300);
        assert_eq!(s.read_microseconds(), 2400);
        s.write(1000);
        assert_eq!(s.read_microseconds(), 1000);
    }

    #[test]
    fn trim_adds_a_sixty_fourth() {
        let mut s = slot();
        s.write_microseconds(1600);
        assert_eq!(s.period_ticks(), 3200 + 50);
    }

    #[test]
    fn map_handles_empty_range() {
        assert_eq!(map(5, 3, 3, 10, 20), 10);
        assert_eq!(map(90, 0, 180, 544, 2400), 1472);
    }
}
