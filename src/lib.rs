//! nRF5 Board Support Library
//!
//! Peripheral drivers for the nRF51/nRF52 family built around one idea:
//! a single hardware TIMER, with its handful of capture/compare registers,
//! is shared by several logical consumers whose edges are produced from
//! interrupt context with no help from application code once configured.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     APPLICATION / FIRMWARE                   │
//! │   configure_channel │ write (PWM) │ attach/write (servo)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        DRIVER LAYER                          │
//! │  SharedTimer  │  PwmMultiplexer  │  ServoScheduler  │  Adc    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     INTERRUPT SHIM (irq)                     │
//! │     IrqCell: critical-section guarded driver + dispatch      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   REGISTER SEAMS (hal)                       │
//! │   TimerRegisters │ GpioRegisters │ AdcRegisters │ Pwm...     │
//! │       nrf (embassy-nrf PAC)     │     sim (host tests)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Owned tables**: every slot table is a field of the driver that uses
//!   it; there are no process-wide arrays
//! - **Explicit critical sections**: mainline code reaches a driver only
//!   through [`irq::IrqCell`], so table mutations never tear against the
//!   interrupt handler
//! - **Testable handlers**: drivers are generic over the register seams in
//!   [`hal`], and the host build swaps in simulated peripherals
//! - **Explicit error handling**: out-of-range pins and channels, exhausted
//!   tables and stuck peripherals are reported through [`Error`]

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_nrf;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Register seams
///
/// Traits describing the peripheral registers the drivers touch, with the
/// nRF implementation and the host simulation behind them.
pub mod hal;

/// Interrupt shim
///
/// Critical-section guarded driver storage and interrupt dispatch.
pub mod irq;

/// Shared compare timer
///
/// One TIMER peripheral, N compare channels, N independent periodic callbacks.
pub mod timer;

/// Pulse-width modulation
///
/// Software PWM multiplexed on TIMER compare channels, plus the nRF52
/// hardware PWM units.
pub mod pwm;

/// Servo pulse scheduling
///
/// Round-robin servo pulse trains, several servos per TIMER.
pub mod servo;

/// Analog input
///
/// Blocking single-sample conversions with resolution mapping.
pub mod analog;

/// Board pin map
pub mod board;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

mod error;

pub use crate::error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::analog::{AnalogReader, SpinLimit};
    pub use crate::board::{BoardPins, PinMap};
    pub use crate::config::*;
    pub use crate::irq::{InterruptHandler, IrqCell};
    pub use crate::pwm::{HardwarePwm, PwmMultiplexer, PwmSource};
    pub use crate::servo::{ServoHandle, ServoScheduler};
    pub use crate::timer::SharedTimer;
    pub use crate::types::*;
    pub use crate::{Error, Result};

    // Register seams
    pub use crate::hal::adc::AdcRegisters;
    pub use crate::hal::gpio::GpioRegisters;
    pub use crate::hal::pwm::PwmRegisters;
    pub use crate::hal::timer::{TimerConfig, TimerRegisters};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
