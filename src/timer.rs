//! Shared compare timer
//!
//! One TIMER peripheral whose CC registers are handed out to independent
//! periodic consumers. Each registered channel carries a reload increment;
//! the interrupt handler adds it to the channel's compare value on every
//! match, so deadlines accumulate forward from the previous deadline and
//! handler latency never turns into drift.

mod registry;
mod shared;

pub use registry::{CompareCallback, CompareSlot, SlotRegistry};
pub use shared::SharedTimer;
