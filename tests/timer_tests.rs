//! Shared Timer Tests
//!
//! Tests for compare-slot registration, start-up programming and the
//! forward-accumulating interrupt handler, run against the simulated TIMER.
//! Run with: cargo test --no-default-features --features std --test timer_tests

use std::cell::RefCell;

use nrf5_bsp::hal::sim::{SimClock, SimTimer};
use nrf5_bsp::hal::timer::{TimerConfig, TimerRegisters};
use nrf5_bsp::timer::SharedTimer;
use nrf5_bsp::types::{BitMode, Prescaler, Priority, TimerMode};
use nrf5_bsp::Error;

thread_local! {
    static FIRED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

fn record(channel: usize) {
    FIRED.with(|f| f.borrow_mut().push(channel));
}

fn take_fired() -> Vec<usize> {
    FIRED.with(|f| std::mem::take(&mut *f.borrow_mut()))
}

fn setup() -> (SimTimer, SharedTimer<SimTimer>) {
    let clock = SimClock::new();
    let sim = SimTimer::new(&clock, 4);
    let timer = SharedTimer::new(sim.clone());
    (sim, timer)
}

// =============================================================================
// Registration Tests
// =============================================================================

#[test]
fn configure_channel_records_slot() {
    let (_sim, mut timer) = setup();
    timer.configure_channel(2, 1234, record).unwrap();
    let slot = timer.slot(2).unwrap();
    assert!(slot.is_registered());
    assert_eq!(slot.reload(), 1234);
    assert!(!timer.slot(0).unwrap().is_registered());
}

#[test]
fn configure_channel_out_of_range() {
    let (_sim, mut timer) = setup();
    assert_eq!(
        timer.configure_channel(4, 100, record),
        Err(Error::InvalidChannel(4))
    );
}

#[test]
fn channel_limit_follows_instance() {
    // A six-channel table on a four-channel TIMER only exposes four
    let clock = SimClock::new();
    let mut timer: SharedTimer<SimTimer, 6> = SharedTimer::new(SimTimer::new(&clock, 4));
    assert!(timer.configure_channel(3, 100, record).is_ok());
    assert_eq!(
        timer.configure_channel(5, 100, record),
        Err(Error::InvalidChannel(5))
    );
}

#[test]
fn release_channel_frees_slot() {
    let (_sim, mut timer) = setup();
    timer.configure_channel(1, 500, record).unwrap();
    timer.release_channel(1).unwrap();
    assert!(!timer.slot(1).unwrap().is_registered());
}

#[test]
fn reconfigure_while_running_rejected() {
    let (_sim, mut timer) = setup();
    timer.configure_channel(0, 1000, record).unwrap();
    timer.start().unwrap();

    assert_eq!(timer.configure_channel(1, 10, record), Err(Error::TimerRunning));
    assert_eq!(timer.release_channel(0), Err(Error::TimerRunning));
    assert_eq!(timer.configure(TimerConfig::default()), Err(Error::TimerRunning));
    assert_eq!(timer.start(), Err(Error::TimerRunning));

    timer.stop();
    assert!(timer.configure_channel(1, 10, record).is_ok());
}

// =============================================================================
// Start-up Tests
// =============================================================================

#[test]
fn start_programs_registered_channels() {
    let (sim, mut timer) = setup();
    timer.configure_channel(0, 1000, record).unwrap();
    timer.configure_channel(2, 70_000, record).unwrap();
    timer.start().unwrap();

    assert!(sim.is_running());
    assert!(sim.irq_enabled());
    assert!(sim.shorts_cleared());
    assert_eq!(sim.mode(), TimerMode::Timer);
    assert_eq!(sim.bit_mode(), BitMode::Bits16);
    assert_eq!(sim.prescaler(), Prescaler::new(1));
    assert_eq!(sim.priority(), Priority::new(3));
    assert_eq!(sim.counter(), 0);

    assert_eq!(sim.compare(0), 1000);
    // Reload is masked to the counter width
    assert_eq!(sim.compare(2), 70_000 & 0xFFFF);
    assert!(sim.interrupt_enabled(0));
    assert!(!sim.interrupt_enabled(1));
    assert!(sim.interrupt_enabled(2));
    assert!(!sim.interrupt_enabled(3));
}

#[test]
fn start_removes_leftover_clear_short() {
    let (sim, mut timer) = setup();
    // A COMPARE0_CLEAR short from whoever used the TIMER before
    sim.set_clear_short(0);
    timer.configure_channel(0, 1000, record).unwrap();
    timer.start().unwrap();

    for k in 1..=5u64 {
        assert_eq!(sim.advance_to_next_event(), Some(k * 1000));
        timer.on_interrupt();
    }
    assert_eq!(sim.counter(), 5000);
    assert_eq!(take_fired().len(), 5);
}

#[test]
fn stop_masks_interrupt() {
    let (sim, mut timer) = setup();
    timer.configure_channel(0, 1000, record).unwrap();
    timer.start().unwrap();
    timer.stop();
    assert!(!timer.is_running());
    assert!(!sim.is_running());
    assert!(!sim.irq_enabled());
    assert_eq!(sim.advance_to_next_event(), None);
}

#[test]
fn custom_priority_applied() {
    let clock = SimClock::new();
    let sim = SimTimer::new(&clock, 4);
    let mut timer: SharedTimer<SimTimer> =
        SharedTimer::new(sim.clone()).with_priority(Priority::new(6).unwrap());
    timer.configure_channel(0, 10, record).unwrap();
    timer.start().unwrap();
    assert_eq!(sim.priority(), Priority::new(6));
}

// =============================================================================
// Interrupt Handler Tests
// =============================================================================

#[test]
fn intervals_do_not_drift_with_latency() {
    let (sim, mut timer) = setup();
    timer.configure_channel(0, 1000, record).unwrap();
    timer.start().unwrap();
    take_fired();

    for k in 1..=150u64 {
        let at = sim.advance_to_next_event().unwrap();
        assert_eq!(at, k * 1000, "match {k} drifted");
        // Handler entry latency
        sim.advance(7);
        let serviced = timer.on_interrupt();
        assert!(serviced.contains(0));
        assert!(!sim.interrupt_pending());
    }
    assert_eq!(take_fired().len(), 150);
}

#[test]
fn independent_channels_keep_their_periods() {
    let (sim, mut timer) = setup();
    timer.configure_channel(0, 300, record).unwrap();
    timer.configure_channel(1, 500, record).unwrap();
    timer.start().unwrap();
    take_fired();

    let mut matches = Vec::new();
    while let Some(at) = sim.advance_to_next_event() {
        if at > 1500 {
            break;
        }
        let serviced = timer.on_interrupt();
        matches.push((at, serviced.bits()));
    }
    assert_eq!(
        matches,
        vec![
            (300, 0b01),
            (500, 0b10),
            (600, 0b01),
            (900, 0b01),
            (1000, 0b10),
            (1200, 0b01),
            (1500, 0b11),
        ]
    );
    // Coincident matches run in ascending channel order
    let fired = take_fired();
    assert_eq!(&fired[fired.len() - 2..], &[0, 1]);
}

#[test]
fn eight_bit_counter_wraps() {
    let (sim, mut timer) = setup();
    let prescaler = Prescaler::new(4).unwrap();
    timer
        .configure(TimerConfig::new(TimerMode::Timer, BitMode::Bits8, prescaler))
        .unwrap();
    timer.configure_channel(0, 100, record).unwrap();
    timer.start().unwrap();
    assert_eq!(sim.bit_mode(), BitMode::Bits8);

    for k in 1..=10u64 {
        assert_eq!(sim.advance_to_next_event(), Some(k * 100));
        timer.on_interrupt();
        #[allow(clippy::cast_possible_truncation)]
        let expected = ((k + 1) * 100 % 256) as u32;
        assert_eq!(sim.compare(0), expected);
    }
}

#[test]
fn spurious_interrupt_services_nothing() {
    let (_sim, mut timer) = setup();
    timer.configure_channel(0, 1000, record).unwrap();
    timer.start().unwrap();
    assert!(timer.on_interrupt().is_empty());
}

#[test]
fn released_channel_stays_quiet() {
    let (sim, mut timer) = setup();
    timer.configure_channel(0, 100, record).unwrap();
    timer.configure_channel(1, 150, record).unwrap();
    timer.release_channel(1).unwrap();
    timer.start().unwrap();
    take_fired();

    for _ in 0..6 {
        sim.advance_to_next_event().unwrap();
        timer.on_interrupt();
    }
    assert!(take_fired().iter().all(|&ch| ch == 0));
}
