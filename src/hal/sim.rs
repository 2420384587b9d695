//! Simulated peripherals
//!
//! In-memory register models used by the host test suite. Each peripheral
//! is a cheap cloneable handle over shared state: the driver owns one
//! handle and the test keeps another to drive time forward and inspect
//! what the driver did.
//!
//! Time is a shared tick counter ([`SimClock`]). It advances only when a
//! test steps a [`SimTimer`], by the number of ticks of that timer, so
//! timestamps are only comparable between peripherals stepped by the same
//! timer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use super::adc::{AdcEvent, AdcRegisters, AdcTask, AnalogInput};
use super::gpio::{GpioRegisters, Level};
use super::pwm::{PwmRegisters, PwmSequence};
use super::timer::TimerRegisters;
use crate::config::hw_pwm::CHANNELS_PER_UNIT;
use crate::config::{PHYSICAL_PIN_COUNT, TIMER_CC_COUNT_EXTENDED};
use crate::types::{BitMode, PhysicalPin, Prescaler, Priority, TimerMode};

/// Shared simulation time in timer ticks
#[derive(Clone, Debug, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    /// Create a clock at tick zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick
    #[must_use]
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    fn advance(&self, ticks: u64) {
        self.0.set(self.0.get() + ticks);
    }
}

// ============================================================================
// TIMER
// ============================================================================

#[derive(Debug)]
struct TimerState {
    channels: usize,
    counter: u32,
    cc: [u32; TIMER_CC_COUNT_EXTENDED],
    events: [bool; TIMER_CC_COUNT_EXTENDED],
    inten: [bool; TIMER_CC_COUNT_EXTENDED],
    running: bool,
    mode: TimerMode,
    bit_mode: BitMode,
    prescaler: Option<Prescaler>,
    shorts_cleared: bool,
    clear_shorts: u8,
    irq_enabled: bool,
    priority: Option<Priority>,
    starts: u32,
    stops: u32,
}

impl TimerState {
    /// Ticks until the counter next equals `cc`; a compare equal to the
    /// current count fires after a full wrap
    fn distance(&self, cc: u32) -> u64 {
        let mask = self.bit_mode.mask();
        let d = cc.wrapping_sub(self.counter) & mask;
        if d == 0 {
            u64::from(mask) + 1
        } else {
            u64::from(d)
        }
    }

    fn step(&mut self, ticks: u64) {
        for ch in 0..self.channels {
            if self.distance(self.cc[ch]) <= ticks {
                self.events[ch] = true;
            }
        }
        // COMPARE[n]_CLEAR restarts the count from the earliest shorted match
        let cleared_at = (0..self.channels)
            .filter(|&ch| self.clear_shorts & (1 << ch) != 0)
            .map(|ch| self.distance(self.cc[ch]))
            .filter(|&d| d <= ticks)
            .min();
        let mask = u64::from(self.bit_mode.mask());
        let counter = match cleared_at {
            Some(d) => (ticks - d) & mask,
            None => (u64::from(self.counter) + ticks) & mask,
        };
        #[allow(clippy::cast_possible_truncation)]
        let counter = counter as u32;
        self.counter = counter;
    }
}

/// Simulated TIMER instance
#[derive(Clone, Debug)]
pub struct SimTimer {
    state: Rc<RefCell<TimerState>>,
    clock: SimClock,
}

impl SimTimer {
    /// Create a stopped timer with `channels` CC registers
    #[must_use]
    pub fn new(clock: &SimClock, channels: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(TimerState {
                channels: channels.min(TIMER_CC_COUNT_EXTENDED),
                counter: 0,
                cc: [0; TIMER_CC_COUNT_EXTENDED],
                events: [false; TIMER_CC_COUNT_EXTENDED],
                inten: [false; TIMER_CC_COUNT_EXTENDED],
                running: false,
                mode: TimerMode::Timer,
                bit_mode: BitMode::Bits16,
                prescaler: None,
                shorts_cleared: false,
                clear_shorts: 0,
                irq_enabled: false,
                priority: None,
                starts: 0,
                stops: 0,
            })),
            clock: clock.clone(),
        }
    }

    /// Advance to the next interrupt-enabled compare match
    ///
    /// Sets the COMPARE events of every channel reached on the way and
    /// returns the new clock value, or None when the timer is stopped or no
    /// compare interrupt is enabled.
    pub fn advance_to_next_event(&self) -> Option<u64> {
        let mut s = self.state.borrow_mut();
        if !s.running {
            return None;
        }
        let ticks = (0..s.channels)
            .filter(|&ch| s.inten[ch])
            .map(|ch| s.distance(s.cc[ch]))
            .min()?;
        s.step(ticks);
        self.clock.advance(ticks);
        Some(self.clock.now())
    }

    /// Advance by a fixed number of ticks, setting events on the way
    pub fn advance(&self, ticks: u64) {
        let mut s = self.state.borrow_mut();
        if s.running {
            s.step(ticks);
        }
        self.clock.advance(ticks);
    }

    /// NVIC would enter the handler now
    #[must_use]
    pub fn interrupt_pending(&self) -> bool {
        let s = self.state.borrow();
        s.irq_enabled && (0..s.channels).any(|ch| s.events[ch] && s.inten[ch])
    }

    /// Counter value
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.state.borrow().counter
    }

    /// Timer is counting
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Configured counter width
    #[must_use]
    pub fn bit_mode(&self) -> BitMode {
        self.state.borrow().bit_mode
    }

    /// Configured mode
    #[must_use]
    pub fn mode(&self) -> TimerMode {
        self.state.borrow().mode
    }

    /// Configured prescaler, None until written
    #[must_use]
    pub fn prescaler(&self) -> Option<Prescaler> {
        self.state.borrow().prescaler
    }

    /// SHORTS were cleared at least once
    #[must_use]
    pub fn shorts_cleared(&self) -> bool {
        self.state.borrow().shorts_cleared
    }

    /// Set the COMPARE[channel]_CLEAR short, as an earlier owner might
    pub fn set_clear_short(&self, channel: usize) {
        let mut s = self.state.borrow_mut();
        if channel < s.channels {
            s.clear_shorts |= 1 << channel;
        }
    }

    /// NVIC line unmasked
    #[must_use]
    pub fn irq_enabled(&self) -> bool {
        self.state.borrow().irq_enabled
    }

    /// Last NVIC priority written
    #[must_use]
    pub fn priority(&self) -> Option<Priority> {
        self.state.borrow().priority
    }

    /// Number of START tasks triggered
    #[must_use]
    pub fn start_count(&self) -> u32 {
        self.state.borrow().starts
    }

    /// Number of STOP tasks triggered
    #[must_use]
    pub fn stop_count(&self) -> u32 {
        self.state.borrow().stops
    }
}

impl TimerRegisters for SimTimer {
    fn channel_count(&self) -> usize {
        self.state.borrow().channels
    }

    fn start(&mut self) {
        let mut s = self.state.borrow_mut();
        s.running = true;
        s.starts += 1;
    }

    fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.running = false;
        s.stops += 1;
    }

    fn clear(&mut self) {
        self.state.borrow_mut().counter = 0;
    }

    fn set_mode(&mut self, mode: TimerMode) {
        self.state.borrow_mut().mode = mode;
    }

    fn set_bit_mode(&mut self, bit_mode: BitMode) {
        self.state.borrow_mut().bit_mode = bit_mode;
    }

    fn set_prescaler(&mut self, prescaler: Prescaler) {
        self.state.borrow_mut().prescaler = Some(prescaler);
    }

    fn disable_shorts(&mut self) {
        let mut s = self.state.borrow_mut();
        s.shorts_cleared = true;
        s.clear_shorts = 0;
    }

    fn compare(&self, channel: usize) -> u32 {
        self.state.borrow().cc[channel]
    }

    fn set_compare(&mut self, channel: usize, value: u32) {
        let mut s = self.state.borrow_mut();
        // CC registers hold only as many bits as the counter
        s.cc[channel] = value & s.bit_mode.mask();
    }

    fn event_pending(&self, channel: usize) -> bool {
        self.state.borrow().events[channel]
    }

    fn clear_event(&mut self, channel: usize) {
        self.state.borrow_mut().events[channel] = false;
    }

    fn enable_interrupt(&mut self, channel: usize) {
        self.state.borrow_mut().inten[channel] = true;
    }

    fn disable_interrupt(&mut self, channel: usize) {
        self.state.borrow_mut().inten[channel] = false;
    }

    fn interrupt_enabled(&self, channel: usize) -> bool {
        self.state.borrow().inten[channel]
    }

    fn disable_irq(&mut self) {
        self.state.borrow_mut().irq_enabled = false;
    }

    fn enable_irq(&mut self, priority: Priority) {
        let mut s = self.state.borrow_mut();
        s.priority = Some(priority);
        s.irq_enabled = true;
    }
}

// ============================================================================
// GPIO
// ============================================================================

/// A level change on a pin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Pin that changed
    pub pin: PhysicalPin,
    /// New level
    pub level: Level,
    /// Clock tick of the change
    pub at: u64,
}

#[derive(Debug)]
struct GpioState {
    levels: [Level; PHYSICAL_PIN_COUNT],
    outputs: [bool; PHYSICAL_PIN_COUNT],
    configures: [u32; PHYSICAL_PIN_COUNT],
    edges: Vec<Edge>,
}

/// Simulated GPIO ports recording every level change
#[derive(Clone, Debug)]
pub struct SimGpio {
    state: Rc<RefCell<GpioState>>,
    clock: SimClock,
}

impl SimGpio {
    /// Create GPIO ports with every pin low and unconfigured
    #[must_use]
    pub fn new(clock: &SimClock) -> Self {
        Self {
            state: Rc::new(RefCell::new(GpioState {
                levels: [Level::Low; PHYSICAL_PIN_COUNT],
                outputs: [false; PHYSICAL_PIN_COUNT],
                configures: [0; PHYSICAL_PIN_COUNT],
                edges: Vec::new(),
            })),
            clock: clock.clone(),
        }
    }

    /// Current output level
    #[must_use]
    pub fn level(&self, pin: PhysicalPin) -> Level {
        self.state.borrow().levels[usize::from(pin.number())]
    }

    /// Pin was configured as an output
    #[must_use]
    pub fn is_output(&self, pin: PhysicalPin) -> bool {
        self.state.borrow().outputs[usize::from(pin.number())]
    }

    /// Number of PIN_CNF writes for a pin
    #[must_use]
    pub fn configure_count(&self, pin: PhysicalPin) -> u32 {
        self.state.borrow().configures[usize::from(pin.number())]
    }

    /// Every recorded level change, oldest first
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.state.borrow().edges.clone()
    }

    /// Level changes of one pin
    #[must_use]
    pub fn edges_of(&self, pin: PhysicalPin) -> Vec<Edge> {
        self.state
            .borrow()
            .edges
            .iter()
            .filter(|e| e.pin == pin)
            .copied()
            .collect()
    }

    /// Closed high intervals `(rise, fall)` of one pin
    #[must_use]
    pub fn high_intervals(&self, pin: PhysicalPin) -> Vec<(u64, u64)> {
        let mut intervals = Vec::new();
        let mut rise = None;
        for edge in self.edges_of(pin) {
            match (edge.level, rise) {
                (Level::High, None) => rise = Some(edge.at),
                (Level::Low, Some(r)) => {
                    intervals.push((r, edge.at));
                    rise = None;
                }
                _ => {}
            }
        }
        intervals
    }

    /// Forget recorded edges
    pub fn clear_edges(&self) {
        self.state.borrow_mut().edges.clear();
    }

    fn drive(&self, pin: PhysicalPin, level: Level) {
        let mut s = self.state.borrow_mut();
        let idx = usize::from(pin.number());
        if s.levels[idx] != level {
            s.levels[idx] = level;
            s.edges.push(Edge {
                pin,
                level,
                at: self.clock.now(),
            });
        }
    }
}

impl GpioRegisters for SimGpio {
    fn configure_output(&mut self, pin: PhysicalPin) {
        let mut s = self.state.borrow_mut();
        let idx = usize::from(pin.number());
        s.outputs[idx] = true;
        s.configures[idx] += 1;
    }

    fn set_high(&mut self, pin: PhysicalPin) {
        self.drive(pin, Level::High);
    }

    fn set_low(&mut self, pin: PhysicalPin) {
        self.drive(pin, Level::Low);
    }
}

// ============================================================================
// ADC
// ============================================================================

#[derive(Debug)]
struct AdcState {
    enabled: bool,
    input: Option<AnalogInput>,
    bits: u8,
    sample: i16,
    responsive: bool,
    samples_on_start: bool,
    started: bool,
    end: bool,
    stopped: bool,
    tasks: Vec<AdcTask>,
}

/// Simulated ADC returning a preset sample
#[derive(Clone, Debug)]
pub struct SimAdc {
    state: Rc<RefCell<AdcState>>,
}

impl SimAdc {
    fn with_mode(samples_on_start: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(AdcState {
                enabled: false,
                input: None,
                bits: 0,
                sample: 0,
                responsive: true,
                samples_on_start,
                started: false,
                end: false,
                stopped: false,
                tasks: Vec::new(),
            })),
        }
    }

    /// nRF52 SAADC: START, then SAMPLE raises END
    #[must_use]
    pub fn saadc() -> Self {
        Self::with_mode(false)
    }

    /// nRF51 ADC: START converts and raises END
    #[must_use]
    pub fn nrf51() -> Self {
        Self::with_mode(true)
    }

    /// Value the next conversion produces
    pub fn set_sample(&self, sample: i16) {
        self.state.borrow_mut().sample = sample;
    }

    /// When false no task ever raises an event
    pub fn set_responsive(&self, responsive: bool) {
        self.state.borrow_mut().responsive = responsive;
    }

    /// ENABLE register
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    /// Last configured input
    #[must_use]
    pub fn input(&self) -> Option<AnalogInput> {
        self.state.borrow().input
    }

    /// Last configured hardware sample width
    #[must_use]
    pub fn bits(&self) -> u8 {
        self.state.borrow().bits
    }

    /// Tasks triggered so far, oldest first
    #[must_use]
    pub fn tasks(&self) -> Vec<AdcTask> {
        self.state.borrow().tasks.clone()
    }

    /// Any event register left set
    #[must_use]
    pub fn events_pending(&self) -> bool {
        let s = self.state.borrow();
        s.started || s.end || s.stopped
    }
}

impl AdcRegisters for SimAdc {
    fn enable(&mut self) {
        self.state.borrow_mut().enabled = true;
    }

    fn disable(&mut self) {
        self.state.borrow_mut().enabled = false;
    }

    fn configure(&mut self, input: AnalogInput, bits: u8) {
        let mut s = self.state.borrow_mut();
        s.input = Some(input);
        s.bits = bits;
    }

    fn trigger(&mut self, task: AdcTask) {
        let mut s = self.state.borrow_mut();
        s.tasks.push(task);
        if !s.responsive {
            return;
        }
        match task {
            AdcTask::Start => {
                s.started = true;
                if s.samples_on_start {
                    s.end = true;
                }
            }
            AdcTask::Sample => s.end = true,
            AdcTask::Stop => s.stopped = true,
        }
    }

    fn event(&self, event: AdcEvent) -> bool {
        let s = self.state.borrow();
        match event {
            AdcEvent::Started => s.started,
            AdcEvent::End => s.end,
            AdcEvent::Stopped => s.stopped,
        }
    }

    fn clear_event(&mut self, event: AdcEvent) {
        let mut s = self.state.borrow_mut();
        match event {
            AdcEvent::Started => s.started = false,
            AdcEvent::End => s.end = false,
            AdcEvent::Stopped => s.stopped = false,
        }
    }

    fn result(&self) -> i16 {
        self.state.borrow().sample
    }
}

// ============================================================================
// PWM
// ============================================================================

#[derive(Debug, Default)]
struct PwmState {
    enabled: bool,
    divider_log2: Option<u8>,
    top: u16,
    pins: [Option<PhysicalPin>; CHANNELS_PER_UNIT],
    sequence: Option<PwmSequence>,
    loads: u32,
    configures: u32,
}

/// Simulated hardware PWM unit
#[derive(Clone, Debug, Default)]
pub struct SimPwm {
    state: Rc<RefCell<PwmState>>,
}

impl SimPwm {
    /// Create a disabled unit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ENABLE register
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    /// PRESCALER, None until configured
    #[must_use]
    pub fn divider_log2(&self) -> Option<u8> {
        self.state.borrow().divider_log2
    }

    /// COUNTERTOP
    #[must_use]
    pub fn top(&self) -> u16 {
        self.state.borrow().top
    }

    /// PSEL.OUT of a channel
    #[must_use]
    pub fn pin(&self, channel: usize) -> Option<PhysicalPin> {
        self.state.borrow().pins[channel]
    }

    /// Sequence most recently started
    #[must_use]
    pub fn sequence(&self) -> Option<PwmSequence> {
        self.state.borrow().sequence
    }

    /// Number of SEQSTART tasks
    #[must_use]
    pub fn load_count(&self) -> u32 {
        self.state.borrow().loads
    }

    /// Number of full reconfigurations
    #[must_use]
    pub fn configure_count(&self) -> u32 {
        self.state.borrow().configures
    }
}

impl PwmRegisters for SimPwm {
    fn enable(&mut self) {
        self.state.borrow_mut().enabled = true;
    }

    fn disable(&mut self) {
        self.state.borrow_mut().enabled = false;
    }

    fn configure(&mut self, divider_log2: u8, top: u16) {
        let mut s = self.state.borrow_mut();
        s.divider_log2 = Some(divider_log2);
        s.top = top;
        s.configures += 1;
    }

    fn connect(&mut self, channel: usize, pin: Option<PhysicalPin>) {
        self.state.borrow_mut().pins[channel] = pin;
    }

    fn load_sequence(&mut self, sequence: &PwmSequence) {
        let mut s = self.state.borrow_mut();
        s.sequence = Some(*sequence);
        s.loads += 1;
    }
}
