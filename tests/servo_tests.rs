//! Servo Tests
//!
//! Tests for servo slot allocation, angle/pulse conversion and the bank
//! pulse state machine, run against the simulated TIMER and GPIO.
//! Run with: cargo test --no-default-features --features std --test servo_tests

use nrf5_bsp::board::BoardPins;
use nrf5_bsp::hal::gpio::Level;
use nrf5_bsp::hal::sim::{SimClock, SimGpio, SimTimer};
use nrf5_bsp::hal::timer::TimerRegisters;
use nrf5_bsp::servo::{Cursor, ServoScheduler, ServoSlot};
use nrf5_bsp::types::{BitMode, PhysicalPin, Prescaler, Priority};
use nrf5_bsp::Error;
use proptest::prelude::*;

struct Rig {
    timer: SimTimer,
    gpio: SimGpio,
    servos: ServoScheduler<SimTimer, SimGpio, BoardPins, 1>,
}

fn rig() -> Rig {
    let clock = SimClock::new();
    let timer = SimTimer::new(&clock, 4);
    let gpio = SimGpio::new(&clock);
    let servos = ServoScheduler::new([timer.clone()], gpio.clone(), BoardPins::IDENTITY);
    Rig {
        timer,
        gpio,
        servos,
    }
}

fn pin(n: u8) -> PhysicalPin {
    PhysicalPin::new(n).unwrap()
}

/// Run the bank through `events` compare matches
fn run(rig: &mut Rig, events: usize) {
    for _ in 0..events {
        rig.timer.advance_to_next_event().unwrap();
        rig.servos.on_interrupt(0);
    }
}

// =============================================================================
// Bank Start-up Tests
// =============================================================================

#[test]
fn first_attach_starts_bank() {
    let mut rig = rig();
    assert!(!rig.timer.is_running());
    rig.servos.attach_default(17).unwrap();

    assert!(rig.timer.is_running());
    assert!(rig.servos.bank(0).unwrap().is_running());
    assert_eq!(rig.timer.bit_mode(), BitMode::Bits16);
    assert_eq!(rig.timer.prescaler(), Prescaler::new(3));
    assert_eq!(rig.timer.priority(), Priority::new(1));
    assert_eq!(rig.timer.compare(0), 40_000);
    assert!(rig.timer.interrupt_enabled(0));
    assert!(rig.gpio.is_output(pin(17)));
    assert_eq!(rig.servos.bank(0).unwrap().cursor(), Cursor::RefreshGap);
}

#[test]
fn second_attach_does_not_restart() {
    let mut rig = rig();
    rig.servos.attach_default(17).unwrap();
    rig.servos.attach_default(18).unwrap();
    assert_eq!(rig.timer.start_count(), 1);
}

// =============================================================================
// Pulse Train Tests
// =============================================================================

#[test]
fn first_scan_after_refresh_period() {
    let mut rig = rig();
    rig.servos.attach_default(17).unwrap();
    run(&mut rig, 1);

    let edges = rig.gpio.edges_of(pin(17));
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].level, Level::High);
    assert_eq!(edges[0].at, 40_000);
    assert_eq!(rig.servos.bank(0).unwrap().cursor(), Cursor::Slot(0));
}

#[test]
fn pulse_length_includes_trim() {
    let mut rig = rig();
    let h = rig.servos.attach_default(17).unwrap();
    rig.servos.write_microseconds(h, 1000).unwrap();
    run(&mut rig, 2);

    let highs = rig.gpio.high_intervals(pin(17));
    // 2000 ticks plus 2000 >> 6
    assert_eq!(highs, vec![(40_000, 40_000 + 2031)]);
}

#[test]
fn refresh_cycle_is_fixed() {
    let mut rig = rig();
    rig.servos.attach_default(17).unwrap();
    run(&mut rig, 6);

    let rises: Vec<u64> = rig
        .gpio
        .high_intervals(pin(17))
        .iter()
        .map(|&(rise, _)| rise)
        .collect();
    assert_eq!(rises, vec![40_000, 80_625, 121_250]);
}

#[test]
fn pulses_never_overlap() {
    let mut rig = rig();
    let widths = [600, 1500, 2400, 1000];
    for (p, us) in (17..).zip(widths) {
        let h = rig.servos.attach_default(p).unwrap();
        rig.servos.write_microseconds(h, us).unwrap();
    }
    run(&mut rig, 30);

    let mut high = 0i32;
    for edge in rig.gpio.edges() {
        high += if edge.level == Level::High { 1 } else { -1 };
        assert!((0..=1).contains(&high), "two outputs high at {}", edge.at);
    }
}

#[test]
fn pulses_run_back_to_back() {
    let mut rig = rig();
    let a = rig.servos.attach_default(17).unwrap();
    let b = rig.servos.attach_default(18).unwrap();
    rig.servos.write_microseconds(a, 1000).unwrap();
    rig.servos.write_microseconds(b, 2000).unwrap();
    run(&mut rig, 3);

    let first = rig.gpio.high_intervals(pin(17))[0];
    let second = rig.gpio.high_intervals(pin(18))[0];
    assert_eq!(first.1, second.0);
    assert_eq!(second.1 - second.0, 4000 + 62);
}

#[test]
fn full_bank_overruns_refresh() {
    let mut rig = rig();
    for p in 2..14 {
        let h = rig.servos.attach_default(p).unwrap();
        rig.servos.write_microseconds(h, 2400).unwrap();
    }
    // Gap, then twelve pulse ends
    run(&mut rig, 13);

    assert_eq!(rig.servos.bank(0).unwrap().cursor(), Cursor::RefreshGap);
    assert_eq!(rig.timer.compare(0), 12 * (4800 + 75) + 4);
}

#[test]
fn short_scan_waits_for_refresh() {
    let mut rig = rig();
    rig.servos.attach_default(17).unwrap();
    run(&mut rig, 2);
    assert_eq!(rig.timer.compare(0), 40_625);
}

#[test]
fn detached_slot_keeps_its_time() {
    let mut rig = rig();
    let a = rig.servos.attach_default(17).unwrap();
    rig.servos.attach_default(18).unwrap();
    rig.servos.detach(a).unwrap();
    run(&mut rig, 3);

    assert!(rig.gpio.edges_of(pin(17)).is_empty());
    // Slot 0 still takes its pulse width before slot 1 rises
    assert_eq!(rig.gpio.high_intervals(pin(18))[0].0, 40_000 + 3046);
}

// =============================================================================
// Allocation Tests
// =============================================================================

#[test]
fn handles_issued_in_order() {
    let mut rig = rig();
    let a = rig.servos.attach_default(17).unwrap();
    let b = rig.servos.attach_default(18).unwrap();
    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
    assert_eq!(b.bank(), 0);
    assert_eq!(rig.servos.allocated(), 2);
    assert_eq!(rig.servos.capacity(), 12);
}

#[test]
fn exhaustion_leaves_table_intact() {
    let mut rig = rig();
    let handles: Vec<_> = (2..14)
        .map(|p| rig.servos.attach_default(p).unwrap())
        .collect();
    rig.servos.write(handles[3], 90).unwrap();

    assert_eq!(rig.servos.attach_default(20), Err(Error::NoFreeSlot));
    assert_eq!(rig.servos.allocated(), 12);
    assert_eq!(rig.servos.read(handles[3]), Ok(90));
    assert!(handles.iter().all(|&h| rig.servos.attached(h)));
}

#[test]
fn detached_index_not_reclaimed() {
    let mut rig = rig();
    let handles: Vec<_> = (2..14)
        .map(|p| rig.servos.attach_default(p).unwrap())
        .collect();
    rig.servos.detach(handles[5]).unwrap();
    assert!(!rig.servos.attached(handles[5]));
    assert_eq!(rig.servos.attach_default(20), Err(Error::NoFreeSlot));
}

#[test]
fn reattach_reuses_index() {
    let mut rig = rig();
    let h = rig.servos.attach_default(17).unwrap();
    rig.servos.detach(h).unwrap();
    assert!(!rig.timer.is_running());

    rig.servos.reattach(h, 19, 1000, 2000).unwrap();
    assert!(rig.servos.attached(h));
    assert!(rig.timer.is_running());
    let slot = rig.servos.slot(h).unwrap();
    assert_eq!(slot.pin(), pin(19));
    assert_eq!(slot.bounds(), (1000, 2000));
    assert_eq!(rig.servos.allocated(), 1);
}

#[test]
fn detach_drives_low_and_stops_bank() {
    let mut rig = rig();
    let a = rig.servos.attach_default(17).unwrap();
    let b = rig.servos.attach_default(18).unwrap();
    run(&mut rig, 1);
    assert_eq!(rig.gpio.level(pin(17)), Level::High);

    rig.servos.detach(a).unwrap();
    assert_eq!(rig.gpio.level(pin(17)), Level::Low);
    assert!(rig.timer.is_running());

    rig.servos.detach(b).unwrap();
    assert!(!rig.timer.is_running());
    assert!(!rig.servos.bank(0).unwrap().is_running());
}

#[test]
fn bounds_clamped_and_validated() {
    let mut rig = rig();
    let h = rig.servos.attach(17, 100, 5000).unwrap();
    assert_eq!(rig.servos.slot(h).unwrap().bounds(), (544, 2400));
    assert_eq!(rig.servos.attach(18, 2000, 1000), Err(Error::InvalidPulseRange));
    assert_eq!(rig.servos.attach(18, 2400, 3000), Err(Error::InvalidPulseRange));
    assert_eq!(rig.servos.attach(99, 1000, 2000), Err(Error::InvalidPin(99)));
    assert_eq!(rig.servos.allocated(), 1);
}

#[test]
fn unknown_handle_rejected() {
    let mut a = rig();
    let mut b = rig();
    b.servos.attach_default(17).unwrap();
    let foreign = b.servos.attach_default(18).unwrap();

    assert_eq!(a.servos.write(foreign, 90), Err(Error::InvalidHandle));
    assert_eq!(a.servos.detach(foreign), Err(Error::InvalidHandle));
    assert_eq!(a.servos.read_microseconds(foreign), Err(Error::InvalidHandle));
    assert!(!a.servos.attached(foreign));
}

#[test]
fn interrupt_for_missing_bank_ignored() {
    let mut rig = rig();
    rig.servos.attach_default(17).unwrap();
    let edges = rig.gpio.edges().len();

    rig.servos.on_interrupt(1);
    rig.servos.on_interrupt(usize::MAX);
    assert_eq!(rig.gpio.edges().len(), edges);

    // The real bank is unaffected
    run(&mut rig, 1);
    assert_eq!(rig.gpio.level(pin(17)), Level::High);
}

// =============================================================================
// Angle / Pulse Conversion Tests
// =============================================================================

#[test]
fn write_treats_small_values_as_angles() {
    let mut rig = rig();
    let h = rig.servos.attach_default(17).unwrap();
    rig.servos.write(h, 0).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(544));
    rig.servos.write(h, 180).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(2400));
    rig.servos.write(h, 543).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(2400));
    rig.servos.write(h, 544).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(544));
    rig.servos.write(h, 1700).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(1700));
}

#[test]
fn write_microseconds_clamps_to_bounds() {
    let mut rig = rig();
    let h = rig.servos.attach(17, 1000, 2000).unwrap();
    rig.servos.write_microseconds(h, 500).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(1000));
    rig.servos.write_microseconds(h, 2500).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(2000));
    // A width below this servo's minimum is still a width, not an angle
    rig.servos.write(h, 700).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(1000));
    // Angles map onto the servo's own range
    rig.servos.write(h, 90).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(1500));
}

#[test]
fn default_pulse_reads_as_ninety_two_degrees() {
    let mut rig = rig();
    let h = rig.servos.attach_default(17).unwrap();
    assert_eq!(rig.servos.read_microseconds(h), Ok(1500));
    assert_eq!(rig.servos.read(h), Ok(92));
}

fn slot() -> ServoSlot {
    ServoSlot::new(pin(3), 544, 2400)
}

proptest! {
    #[test]
    fn angle_round_trips(angle in 0i32..=180) {
        let mut s = slot();
        s.write(angle);
        prop_assert_eq!(s.read(), angle);
    }

    #[test]
    fn pulse_width_round_trips(us in 544i32..=2400) {
        let mut s = slot();
        s.write_microseconds(us);
        prop_assert_eq!(i32::from(s.read_microseconds()), us);
    }

    #[test]
    fn angle_mapping_is_monotonic(a in 0i32..=180, b in 0i32..=180) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut s_lo = slot();
        let mut s_hi = slot();
        s_lo.write(lo);
        s_hi.write(hi);
        prop_assert!(s_lo.read_microseconds() <= s_hi.read_microseconds());
    }

    #[test]
    fn pulse_always_within_bounds(value in any::<i32>()) {
        let mut s = slot();
        s.write(value);
        let us = s.read_microseconds();
        prop_assert!((544..=2400).contains(&us));
    }
}
