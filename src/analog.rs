//! Analog input
//!
//! Blocking single conversions on the nRF51 ADC or the nRF52 SAADC. The
//! hardware converts at 8 to 14 bits; results are shifted to the read
//! resolution the application asked for.

mod input;
mod reader;

pub use input::{AdcFamily, SpinLimit};
pub use reader::AnalogReader;
