//! Shared types used across the BSP
//!
//! Validated newtypes for the values that end up in peripheral registers.
//! Constructors return `None` for values the hardware cannot represent.

use core::fmt;

use crate::config::{PERIPHERAL_CLOCK_HZ, PINS_PER_PORT, PHYSICAL_PIN_COUNT};

/// Physical GPIO pin number (port * 32 + index)
///
/// Logical board pins are translated into these by a
/// [`PinMap`](crate::board::PinMap).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysicalPin(u8);

impl PhysicalPin {
    /// Create a physical pin, returns None past the last GPIO
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if (number as usize) < PHYSICAL_PIN_COUNT {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Absolute pin number
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// GPIO port holding this pin (P0 or P1)
    #[must_use]
    pub const fn port(self) -> u8 {
        self.0 / PINS_PER_PORT
    }

    /// Index within the port
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0 % PINS_PER_PORT
    }

    /// Bit mask for the port-level OUTSET/OUTCLR registers
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.index()
    }
}

impl fmt::Debug for PhysicalPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}.{:02}", self.port(), self.index())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PhysicalPin {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "P{}.{}", self.port(), self.index());
    }
}

/// TIMER prescaler: f_tick = 16 MHz / 2^prescaler
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Prescaler(u8);

impl Prescaler {
    /// Largest prescaler the TIMER accepts
    pub const MAX: u8 = 9;

    /// Create a prescaler, returns None above [`Self::MAX`]
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Raw register value
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Counter tick rate in Hz
    #[must_use]
    pub const fn tick_hz(self) -> u32 {
        PERIPHERAL_CLOCK_HZ >> self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Prescaler {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "/{}", 1u32 << self.0);
    }
}

/// Counter width of a TIMER
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BitMode {
    /// 8-bit counter
    Bits8,
    /// 16-bit counter
    #[default]
    Bits16,
    /// 24-bit counter
    Bits24,
    /// 32-bit counter
    Bits32,
}

impl BitMode {
    /// Narrowest counter that holds a value of `bits` bits
    #[must_use]
    pub const fn for_resolution(bits: u8) -> Self {
        match bits {
            0..=8 => Self::Bits8,
            9..=16 => Self::Bits16,
            17..=24 => Self::Bits24,
            _ => Self::Bits32,
        }
    }

    /// Counter width in bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits24 => 24,
            Self::Bits32 => 32,
        }
    }

    /// Largest counter value; the counter wraps to zero after it
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Bits32 => u32::MAX,
            other => (1 << other.bits()) - 1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BitMode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}-bit", self.bits());
    }
}

/// TIMER operating mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimerMode {
    /// Counter increments on every prescaled clock tick
    #[default]
    Timer,
    /// Counter increments on the COUNT task
    Counter,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimerMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Timer => defmt::write!(f, "TIMER"),
            Self::Counter => defmt::write!(f, "COUNTER"),
        }
    }
}

/// NVIC interrupt priority (0 = most urgent)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Priority(u8);

impl Priority {
    /// Lowest priority level supported by the nRF52 NVIC
    pub const LOWEST: u8 = 7;

    /// Create a priority level, returns None above [`Self::LOWEST`]
    #[must_use]
    pub const fn new(level: u8) -> Option<Self> {
        if level <= Self::LOWEST {
            Some(Self(level))
        } else {
            None
        }
    }

    /// Priority level
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Priority {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "P{}", self.0);
    }
}

/// Sample width in bits for analog reads and writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Resolution(u8);

impl Resolution {
    /// Widest supported resolution
    pub const MAX_BITS: u8 = 16;

    /// Create a resolution, returns None outside 1..=16 bits
    #[must_use]
    pub const fn new(bits: u8) -> Option<Self> {
        if bits >= 1 && bits <= Self::MAX_BITS {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Width in bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Full-scale value, (1 << bits) - 1
    #[must_use]
    pub const fn max_value(self) -> u32 {
        (1 << self.0) - 1
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Resolution {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}bit", self.0);
    }
}

/// Rescale `value` from `from` bits to `to` bits by shifting
#[must_use]
pub const fn map_resolution(value: u32, from: u8, to: u8) -> u32 {
    if from == to {
        value
    } else if from > to {
        value >> (from - to)
    } else {
        value << (to - from)
    }
}

/// Set of compare channels serviced by one interrupt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// No channels
    pub const EMPTY: Self = Self(0);

    /// Add a channel
    #[must_use]
    pub const fn with(self, channel: usize) -> Self {
        Self(self.0 | (1 << channel))
    }

    /// Check if a channel is in the set
    #[must_use]
    pub const fn contains(self, channel: usize) -> bool {
        channel < 8 && self.0 & (1 << channel) != 0
    }

    /// Check if no channel was serviced
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of channels in the set
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bit set
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ChannelMask {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u8:b}", self.0);
    }
}
