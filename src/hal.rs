//! Hardware Abstraction Layer
//!
//! Register-level seams over the nRF5 TIMER, GPIO, ADC and PWM peripherals.
//! Drivers are generic over these traits; [`nrf`] implements them on the
//! embassy-nrf PAC and [`sim`] implements them in memory for host tests.

pub mod adc;
pub mod gpio;
pub mod pwm;
pub mod timer;

#[cfg(feature = "embedded")]
pub mod nrf;

#[cfg(feature = "std")]
pub mod sim;
