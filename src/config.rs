//! System configuration and hardware constants
//!
//! Compile-time constants for the nRF5 TIMER, GPIO, PWM and ADC
//! peripherals and for the drivers built on top of them.

use crate::types::{BitMode, Prescaler, Priority, Resolution, TimerMode};

/// High-frequency clock feeding the TIMER and PWM peripherals
pub const PERIPHERAL_CLOCK_HZ: u32 = 16_000_000;

/// GPIO pins per port
pub const PINS_PER_PORT: u8 = 32;

/// Physical GPIOs across P0 and P1 (nRF52840 has both)
pub const PHYSICAL_PIN_COUNT: usize = 48;

/// Capture/compare registers on TIMER0..TIMER2
pub const TIMER_CC_COUNT: usize = 4;

/// Capture/compare registers on TIMER3..TIMER4 (nRF52 only)
pub const TIMER_CC_COUNT_EXTENDED: usize = 6;

/// Shared compare timer defaults
pub mod shared_timer {
    //! Defaults for the shared compare timer

    use super::{BitMode, Prescaler, Priority, TimerMode};

    /// Compare slots on the shared timer
    pub const SLOT_COUNT: usize = super::TIMER_CC_COUNT;

    /// Default prescaler (8 MHz tick)
    pub const PRESCALER: Prescaler = match Prescaler::new(1) {
        Some(p) => p,
        None => panic!("invalid shared timer prescaler"),
    };

    /// Default operating mode
    pub const MODE: TimerMode = TimerMode::Timer;

    /// Default counter width
    pub const BIT_MODE: BitMode = BitMode::Bits16;

    /// Interrupt priority of the shared timer
    pub const PRIORITY: Priority = match Priority::new(3) {
        Some(p) => p,
        None => panic!("invalid shared timer priority"),
    };
}

/// Servo pulse scheduler timing
pub mod servo {
    //! Servo pulse train timing
    //!
    //! A 2 MHz tick keeps the 20 ms refresh period inside a 16-bit counter.

    use super::{BitMode, Prescaler, Priority};

    /// Servo TIMER tick rate
    pub const TIMER_HZ: u32 = 2_000_000;

    /// Prescaler giving [`TIMER_HZ`] from the 16 MHz clock
    pub const PRESCALER: Prescaler = match Prescaler::new(3) {
        Some(p) => p,
        None => panic!("invalid servo prescaler"),
    };

    /// Servo counter width
    pub const BIT_MODE: BitMode = BitMode::Bits16;

    /// Interrupt priority of servo timers
    pub const PRIORITY: Priority = match Priority::new(1) {
        Some(p) => p,
        None => panic!("invalid servo priority"),
    };

    /// Compare register used by the scheduler on each servo timer
    pub const CC_REG: usize = 0;

    /// Servos driven by one timer
    pub const SERVOS_PER_TIMER: usize = 12;

    /// Timers that may carry servo banks (TIMER0..TIMER4)
    pub const MAX_TIMERS: usize = 5;

    /// Slot table capacity across all banks
    pub const MAX_SERVOS: usize = SERVOS_PER_TIMER * MAX_TIMERS;

    /// Shortest pulse width in microseconds
    pub const MIN_PULSE_WIDTH_US: u16 = 544;

    /// Longest pulse width in microseconds
    pub const MAX_PULSE_WIDTH_US: u16 = 2400;

    /// Pulse width of a freshly allocated servo in microseconds
    pub const DEFAULT_PULSE_WIDTH_US: u16 = 1500;

    /// Pulse train refresh period in microseconds
    pub const REFRESH_INTERVAL_US: u32 = 20_000;

    /// Refresh period in ticks
    pub const REFRESH_TICKS: u32 = REFRESH_INTERVAL_US * (TIMER_HZ / 1_000_000);

    /// Slack added past the refresh period before the next scan
    pub const REFRESH_MARGIN_TICKS: u32 = REFRESH_INTERVAL_US >> 5;

    /// Smallest step forward when a scan overruns the refresh period
    pub const OVERRUN_MARGIN_TICKS: u32 = 4;

    /// Pulse trim: ticks >> TRIM_SHIFT is added to every pulse
    pub const TRIM_SHIFT: u32 = 6;

    /// Largest angle accepted by `write`
    pub const MAX_ANGLE: i32 = 180;
}

/// Software PWM multiplexed on TIMER compare channels
pub mod pwm {
    //! Timer-multiplexed PWM

    use super::{Prescaler, Priority, Resolution};

    /// PWM slots across both timer sources
    pub const SLOT_COUNT: usize = 6;

    /// Slots per timer source (CC1..CC3; CC0 marks the cycle boundary)
    pub const SLOTS_PER_SOURCE: usize = 3;

    /// Timer sources
    pub const SOURCE_COUNT: usize = SLOT_COUNT / SLOTS_PER_SOURCE;

    /// Compare channel marking the top of each cycle
    pub const CYCLE_CHANNEL: usize = 0;

    /// Default output resolution
    pub const RESOLUTION: Resolution = match Resolution::new(8) {
        Some(r) => r,
        None => panic!("invalid PWM resolution"),
    };

    /// Default prescaler (125 kHz tick, ~490 Hz at 8 bits)
    pub const PRESCALER: Prescaler = match Prescaler::new(7) {
        Some(p) => p,
        None => panic!("invalid PWM prescaler"),
    };

    /// Interrupt priority of each timer source
    pub const SOURCE_PRIORITIES: [Priority; SOURCE_COUNT] = [
        match Priority::new(3) {
            Some(p) => p,
            None => panic!("invalid PWM priority"),
        },
        match Priority::new(4) {
            Some(p) => p,
            None => panic!("invalid PWM priority"),
        },
    ];
}

/// nRF52 hardware PWM units
pub mod hw_pwm {
    //! Hardware PWM (PWM0..PWM2)

    /// PWM units
    pub const UNIT_COUNT: usize = 3;

    /// Output channels per unit
    pub const CHANNELS_PER_UNIT: usize = 4;

    /// Frequency applied on first write to an unconfigured unit
    pub const DEFAULT_FREQUENCY_HZ: u32 = 500;

    /// Lowest frequency the ÷128 prescaler band accepts
    pub const MIN_FREQUENCY_HZ: u32 = 4;

    /// Largest COUNTERTOP value (15 bits)
    pub const MAX_TOP: u32 = 0x7FFF;

    /// Sequence polarity bit: output starts high, falls at compare
    pub const POLARITY_RISING: u16 = 1 << 15;
}

/// Analog input defaults
pub mod adc {
    //! ADC / SAADC

    use super::Resolution;

    /// Default read resolution
    pub const READ_RESOLUTION: Resolution = match Resolution::new(10) {
        Some(r) => r,
        None => panic!("invalid ADC resolution"),
    };

    /// Analog input channels (AIN0..AIN7)
    pub const INPUT_COUNT: usize = 8;
}
