//! Pulse-width modulation
//!
//! [`PwmMultiplexer`] produces software PWM on any GPIO from two TIMER
//! sources: CC0 of each source marks the top of the cycle and raises every
//! output, CC1..CC3 drop one output each at its duty point.
//!
//! [`HardwarePwm`] drives the nRF52 PWM units directly for pins that can
//! use them.

mod hardware;
mod mux;
mod slots;

pub use hardware::{HardwarePwm, PwmTiming};
pub use mux::{PwmConfig, PwmMultiplexer};
pub use slots::{PwmSlot, PwmSource, SlotTable};
