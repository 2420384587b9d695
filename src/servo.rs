//! Servo pulse scheduling
//!
//! Up to twelve servos share one TIMER and one compare register. The
//! interrupt handler walks the bank as a state machine: each compare match
//! ends the current servo's pulse, starts the next one and moves the
//! deadline forward by that servo's pulse width. After the last servo the
//! bank idles in the refresh gap until the 20 ms period is filled.
//!
//! ```text
//!   RefreshGap ──match──► Slot(0) ──► Slot(1) ──► … ──► Slot(n-1)
//!       ▲                                                  │
//!       └────────────────── bank exhausted ◄───────────────┘
//! ```

mod bank;
mod scheduler;
mod slot;

pub use bank::{Cursor, ServoBank};
pub use scheduler::{ServoHandle, ServoScheduler};
pub use slot::{map, ticks_to_us, us_to_ticks, ServoSlot};
