//! nRF52 register backend
//!
//! Implements the register seams on top of the `embassy_nrf::pac`
//! register blocks. Only the NVIC enable and the SAADC/PWM DMA buffers
//! need `unsafe`; everything else is a plain volatile register access.

#![allow(unsafe_code)]

use embassy_nrf::interrupt::{Interrupt, InterruptExt, Priority as NvicPriority};
use embassy_nrf::pac;
use embassy_nrf::pac::timer::vals::{Bitmode, Mode};

use super::adc::{AdcEvent, AdcRegisters, AdcTask, AnalogInput};
use super::gpio::GpioRegisters;
use super::pwm::{PwmRegisters, PwmSequence};
use super::timer::TimerRegisters;
use crate::config::{TIMER_CC_COUNT, TIMER_CC_COUNT_EXTENDED};
use crate::types::{BitMode, PhysicalPin, Prescaler, Priority, TimerMode};

const fn nvic_priority(priority: Priority) -> NvicPriority {
    match priority.level() {
        0 => NvicPriority::P0,
        1 => NvicPriority::P1,
        2 => NvicPriority::P2,
        3 => NvicPriority::P3,
        4 => NvicPriority::P4,
        5 => NvicPriority::P5,
        6 => NvicPriority::P6,
        _ => NvicPriority::P7,
    }
}

// ============================================================================
// TIMER
// ============================================================================

/// TIMER peripheral instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerInstance {
    /// TIMER0 (reserved by the SoftDevice when one is flashed)
    Timer0,
    /// TIMER1
    Timer1,
    /// TIMER2
    Timer2,
    /// TIMER3, six CC registers
    Timer3,
    /// TIMER4, six CC registers
    Timer4,
}

impl TimerInstance {
    fn regs(self) -> pac::timer::Timer {
        match self {
            Self::Timer0 => pac::TIMER0,
            Self::Timer1 => pac::TIMER1,
            Self::Timer2 => pac::TIMER2,
            Self::Timer3 => pac::TIMER3,
            Self::Timer4 => pac::TIMER4,
        }
    }

    fn interrupt(self) -> Interrupt {
        match self {
            Self::Timer0 => Interrupt::TIMER0,
            Self::Timer1 => Interrupt::TIMER1,
            Self::Timer2 => Interrupt::TIMER2,
            Self::Timer3 => Interrupt::TIMER3,
            Self::Timer4 => Interrupt::TIMER4,
        }
    }
}

impl defmt::Format for TimerInstance {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Timer0 => defmt::write!(f, "TIMER0"),
            Self::Timer1 => defmt::write!(f, "TIMER1"),
            Self::Timer2 => defmt::write!(f, "TIMER2"),
            Self::Timer3 => defmt::write!(f, "TIMER3"),
            Self::Timer4 => defmt::write!(f, "TIMER4"),
        }
    }
}

/// One TIMER instance driven through the PAC
pub struct NrfTimer {
    instance: TimerInstance,
    regs: pac::timer::Timer,
}

impl NrfTimer {
    /// Wrap a TIMER instance
    ///
    /// The caller keeps the matching embassy-nrf singleton out of use for
    /// as long as this handle exists.
    #[must_use]
    pub fn new(instance: TimerInstance) -> Self {
        Self {
            instance,
            regs: instance.regs(),
        }
    }

    /// Wrapped instance
    #[must_use]
    pub const fn instance(&self) -> TimerInstance {
        self.instance
    }
}

impl TimerRegisters for NrfTimer {
    fn channel_count(&self) -> usize {
        match self.instance {
            TimerInstance::Timer3 | TimerInstance::Timer4 => TIMER_CC_COUNT_EXTENDED,
            _ => TIMER_CC_COUNT,
        }
    }

    fn start(&mut self) {
        self.regs.tasks_start().write_value(1);
    }

    fn stop(&mut self) {
        self.regs.tasks_stop().write_value(1);
    }

    fn clear(&mut self) {
        self.regs.tasks_clear().write_value(1);
    }

    fn set_mode(&mut self, mode: TimerMode) {
        let mode = match mode {
            TimerMode::Timer => Mode::TIMER,
            TimerMode::Counter => Mode::COUNTER,
        };
        self.regs.mode().write(|w| w.set_mode(mode));
    }

    fn set_bit_mode(&mut self, bit_mode: BitMode) {
        let bitmode = match bit_mode {
            BitMode::Bits8 => Bitmode::_08BIT,
            BitMode::Bits16 => Bitmode::_16BIT,
            BitMode::Bits24 => Bitmode::_24BIT,
            BitMode::Bits32 => Bitmode::_32BIT,
        };
        self.regs.bitmode().write(|w| w.set_bitmode(bitmode));
    }

    fn set_prescaler(&mut self, prescaler: Prescaler) {
        self.regs
            .prescaler()
            .write(|w| w.set_prescaler(prescaler.value()));
    }

    fn disable_shorts(&mut self) {
        self.regs.shorts().write(|w| w.0 = 0);
    }

    fn compare(&self, channel: usize) -> u32 {
        self.regs.cc(channel).read()
    }

    fn set_compare(&mut self, channel: usize, value: u32) {
        self.regs.cc(channel).write_value(value);
    }

    fn event_pending(&self, channel: usize) -> bool {
        self.regs.events_compare(channel).read() != 0
    }

    fn clear_event(&mut self, channel: usize) {
        self.regs.events_compare(channel).write_value(0);
    }

    fn enable_interrupt(&mut self, channel: usize) {
        self.regs.intenset().write(|w| w.set_compare(channel, true));
    }

    fn disable_interrupt(&mut self, channel: usize) {
        self.regs.intenclr().write(|w| w.set_compare(channel, true));
    }

    fn interrupt_enabled(&self, channel: usize) -> bool {
        self.regs.intenset().read().compare(channel)
    }

    fn disable_irq(&mut self) {
        self.instance.interrupt().disable();
    }

    fn enable_irq(&mut self, priority: Priority) {
        let irq = self.instance.interrupt();
        irq.unpend();
        irq.set_priority(nvic_priority(priority));
        // SAFETY: the handler bound to this line only touches driver state
        // through a critical-section guarded IrqCell.
        unsafe { irq.enable() };
    }
}

// ============================================================================
// GPIO
// ============================================================================

/// GPIO port P0
#[derive(Clone, Copy, Debug, Default)]
pub struct NrfGpio;

impl NrfGpio {
    /// Create the GPIO handle
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn port(pin: PhysicalPin) -> Option<pac::gpio::Gpio> {
        match pin.port() {
            0 => Some(pac::P0),
            _ => {
                warn!("{} is not on P0", pin);
                None
            }
        }
    }
}

impl GpioRegisters for NrfGpio {
    fn configure_output(&mut self, pin: PhysicalPin) {
        use pac::gpio::vals::{Dir, Input};
        if let Some(port) = Self::port(pin) {
            port.pin_cnf(usize::from(pin.index())).write(|w| {
                w.set_dir(Dir::OUTPUT);
                w.set_input(Input::DISCONNECT);
            });
        }
    }

    fn set_high(&mut self, pin: PhysicalPin) {
        if let Some(port) = Self::port(pin) {
            port.outset().write(|w| w.set_pin(usize::from(pin.index()), true));
        }
    }

    fn set_low(&mut self, pin: PhysicalPin) {
        if let Some(port) = Self::port(pin) {
            port.outclr().write(|w| w.set_pin(usize::from(pin.index()), true));
        }
    }
}

// ============================================================================
// SAADC
// ============================================================================

/// nRF52 SAADC, channel 0, single-sample DMA into a static word
pub struct NrfSaadc {
    result: &'static mut i16,
}

impl NrfSaadc {
    /// Create the SAADC handle; `result` receives each conversion by DMA
    #[must_use]
    pub fn new(result: &'static mut i16) -> Self {
        Self { result }
    }
}

impl AdcRegisters for NrfSaadc {
    fn enable(&mut self) {
        pac::SAADC.enable().write(|w| w.set_enable(true));
    }

    fn disable(&mut self) {
        pac::SAADC.enable().write(|w| w.set_enable(false));
    }

    fn configure(&mut self, input: AnalogInput, bits: u8) {
        use pac::saadc::vals::{Gain, Psel, Refsel, Tacq, Val};

        let saadc = pac::SAADC;
        let resolution = match bits {
            0..=8 => Val::_8BIT,
            9..=10 => Val::_10BIT,
            11..=12 => Val::_12BIT,
            _ => Val::_14BIT,
        };
        saadc.resolution().write(|w| w.set_val(resolution));
        saadc.oversample().write(|w| w.0 = 0);
        saadc.ch(0).config().write(|w| {
            w.set_gain(Gain::GAIN1_6);
            w.set_refsel(Refsel::INTERNAL);
            w.set_tacq(Tacq::_3US);
        });
        saadc
            .ch(0)
            .pselp()
            .write(|w| w.set_pselp(Psel::from_bits(input.index() + 1)));
        saadc.ch(0).pseln().write(|w| w.set_pseln(Psel::NC));

        let ptr: *mut i16 = self.result;
        saadc.result().ptr().write_value(ptr as u32);
        saadc.result().maxcnt().write(|w| w.set_maxcnt(1));
    }

    fn trigger(&mut self, task: AdcTask) {
        let saadc = pac::SAADC;
        match task {
            AdcTask::Start => saadc.tasks_start().write_value(1),
            AdcTask::Sample => saadc.tasks_sample().write_value(1),
            AdcTask::Stop => saadc.tasks_stop().write_value(1),
        }
    }

    fn event(&self, event: AdcEvent) -> bool {
        let saadc = pac::SAADC;
        match event {
            AdcEvent::Started => saadc.events_started().read() != 0,
            AdcEvent::End => saadc.events_end().read() != 0,
            AdcEvent::Stopped => saadc.events_stopped().read() != 0,
        }
    }

    fn clear_event(&mut self, event: AdcEvent) {
        let saadc = pac::SAADC;
        match event {
            AdcEvent::Started => saadc.events_started().write_value(0),
            AdcEvent::End => saadc.events_end().write_value(0),
            AdcEvent::Stopped => saadc.events_stopped().write_value(0),
        }
    }

    fn result(&self) -> i16 {
        let ptr: *const i16 = &*self.result;
        // SAFETY: the pointer comes from a live `&'static mut`; the read is
        // volatile because EasyDMA writes it behind the compiler's back.
        unsafe { core::ptr::read_volatile(ptr) }
    }
}

// ============================================================================
// PWM
// ============================================================================

/// Hardware PWM unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmInstance {
    /// PWM0
    Pwm0,
    /// PWM1
    Pwm1,
    /// PWM2
    Pwm2,
}

impl PwmInstance {
    fn regs(self) -> pac::pwm::Pwm {
        match self {
            Self::Pwm0 => pac::PWM0,
            Self::Pwm1 => pac::PWM1,
            Self::Pwm2 => pac::PWM2,
        }
    }
}

/// One hardware PWM unit with its sequence buffer in RAM
pub struct NrfPwm {
    regs: pac::pwm::Pwm,
    sequence: &'static mut PwmSequence,
}

impl NrfPwm {
    /// Wrap a PWM unit; `sequence` must live in RAM for EasyDMA
    #[must_use]
    pub fn new(instance: PwmInstance, sequence: &'static mut PwmSequence) -> Self {
        Self {
            regs: instance.regs(),
            sequence,
        }
    }
}

impl PwmRegisters for NrfPwm {
    fn enable(&mut self) {
        self.regs.enable().write(|w| w.set_enable(true));
    }

    fn disable(&mut self) {
        self.regs.enable().write(|w| w.set_enable(false));
    }

    fn configure(&mut self, divider_log2: u8, top: u16) {
        use pac::pwm::vals::{Load, Mode as DecoderMode, Prescaler as Divider, Updown};

        self.regs.mode().write(|w| w.set_updown(Updown::UP));
        self.regs
            .prescaler()
            .write(|w| w.set_prescaler(Divider::from_bits(divider_log2)));
        self.regs.countertop().write(|w| w.set_countertop(top));
        self.regs.decoder().write(|w| {
            w.set_load(Load::INDIVIDUAL);
            w.set_mode(DecoderMode::REFRESH_COUNT);
        });
        self.regs.loop_().write(|w| w.0 = 0);
    }

    fn connect(&mut self, channel: usize, pin: Option<PhysicalPin>) {
        let psel = self.regs.psel().out(channel);
        match pin {
            Some(pin) => psel.write(|w| {
                w.set_pin(pin.index());
                w.set_connect(true);
            }),
            None => psel.write(|w| w.set_connect(false)),
        }
    }

    fn load_sequence(&mut self, sequence: &PwmSequence) {
        *self.sequence = *sequence;
        let ptr: *const PwmSequence = &*self.sequence;

        let seq = self.regs.seq(0);
        seq.ptr().write_value(ptr as u32);
        #[allow(clippy::cast_possible_truncation)]
        let words = sequence.len() as u16;
        seq.cnt().write(|w| w.set_cnt(words));
        seq.refresh().write(|w| w.0 = 0);
        seq.enddelay().write(|w| w.0 = 0);
        self.regs.tasks_seqstart(0).write_value(1);
    }
}
