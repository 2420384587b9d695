//! nRF52 BSP demo firmware
//!
//! Exercises every driver on one board: a 1 kHz tick on the shared timer,
//! a servo sweep, software and hardware PWM fades, and periodic analog
//! reads. Timer ownership:
//!
//! - TIMER1: shared compare timer
//! - TIMER2: servo bank 0
//! - TIMER3 / TIMER4: software PWM sources

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_nrf::{bind_interrupts, interrupt};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use nrf5_bsp::analog::AdcFamily;
use nrf5_bsp::hal::nrf::{NrfGpio, NrfPwm, NrfSaadc, NrfTimer, PwmInstance, TimerInstance};
use nrf5_bsp::hal::pwm::PwmSequence;
use nrf5_bsp::prelude::*;

type Servos = ServoScheduler<NrfTimer, NrfGpio, BoardPins, 1>;
type SoftPwm = PwmMultiplexer<NrfTimer, NrfGpio, BoardPins>;
type Ticker = SharedTimer<NrfTimer>;

static SERVOS: IrqCell<Servos> = IrqCell::new();
static SOFT_PWM: IrqCell<SoftPwm> = IrqCell::new();
static TICKER: IrqCell<Ticker> = IrqCell::new();

static TICKS: AtomicU32 = AtomicU32::new(0);
static SAADC_RESULT: StaticCell<i16> = StaticCell::new();
static PWM0_SEQUENCE: StaticCell<PwmSequence> = StaticCell::new();

/// Board pins used by the demo
const SERVO_PIN: u32 = 17;
const LED_PIN: u32 = 18;
const HW_PWM_PIN: u32 = 19;
const ANALOG_PIN: u32 = 2;

/// 1 ms at the shared timer's 8 MHz tick
const TICK_RELOAD: u32 = 8_000;

struct TickerIrq;
struct ServoIrq;
struct PwmFirstIrq;
struct PwmSecondIrq;

impl interrupt::typelevel::Handler<interrupt::typelevel::TIMER1> for TickerIrq {
    unsafe fn on_interrupt() {
        TICKER.on_interrupt(());
    }
}

impl interrupt::typelevel::Handler<interrupt::typelevel::TIMER2> for ServoIrq {
    unsafe fn on_interrupt() {
        SERVOS.on_interrupt(0);
    }
}

impl interrupt::typelevel::Handler<interrupt::typelevel::TIMER3> for PwmFirstIrq {
    unsafe fn on_interrupt() {
        SOFT_PWM.on_interrupt(PwmSource::First);
    }
}

impl interrupt::typelevel::Handler<interrupt::typelevel::TIMER4> for PwmSecondIrq {
    unsafe fn on_interrupt() {
        SOFT_PWM.on_interrupt(PwmSource::Second);
    }
}

bind_interrupts!(struct Irqs {
    TIMER1 => TickerIrq;
    TIMER2 => ServoIrq;
    TIMER3 => PwmFirstIrq;
    TIMER4 => PwmSecondIrq;
});

fn on_tick(_channel: usize) {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("nRF5 BSP demo v{}", env!("CARGO_PKG_VERSION"));

    // Keeps TIMER1..4, SAADC and PWM0 singletons out of embassy-nrf's hands
    let _p = embassy_nrf::init(Default::default());
    let _ = Irqs;

    let pins = BoardPins::IDENTITY;

    let mut ticker = Ticker::new(NrfTimer::new(TimerInstance::Timer1));
    if let Err(e) = ticker.configure_channel(0, TICK_RELOAD, on_tick) {
        warn!("shared timer: {}", e);
    }
    // Installed before start so the first match finds a driver
    TICKER.install(ticker);
    if let Some(Err(e)) = TICKER.with(|t| t.start()) {
        warn!("shared timer: {}", e);
    }

    SERVOS.install(Servos::new(
        [NrfTimer::new(TimerInstance::Timer2)],
        NrfGpio::new(),
        pins,
    ));
    SOFT_PWM.install(SoftPwm::new(
        [
            NrfTimer::new(TimerInstance::Timer3),
            NrfTimer::new(TimerInstance::Timer4),
        ],
        NrfGpio::new(),
        pins,
    ));

    let servo = match SERVOS.with(|s| s.attach_default(SERVO_PIN)) {
        Some(Ok(handle)) => Some(handle),
        Some(Err(e)) => {
            warn!("servo attach: {}", e);
            None
        }
        None => None,
    };

    let mut hw_pwm = HardwarePwm::new(
        [NrfPwm::new(PwmInstance::Pwm0, PWM0_SEQUENCE.init([0; 4]))],
        pins,
    );

    let adc = AnalogReader::new(NrfSaadc::new(SAADC_RESULT.init(0)), pins, AdcFamily::Nrf52Saadc);

    if let Some(handle) = servo {
        if let Err(e) = spawner.spawn(servo_sweep_task(handle)) {
            warn!("spawn servo sweep: {}", e);
        }
    }
    if let Err(e) = spawner.spawn(analog_task(adc)) {
        warn!("spawn analog: {}", e);
    }

    let mut duty = 0u32;
    loop {
        duty = (duty + 8) % 256;
        if let Some(Err(e)) = SOFT_PWM.with(|pwm| pwm.write(LED_PIN, duty)) {
            warn!("soft pwm: {}", e);
        }
        if let Err(e) = hw_pwm.write(HW_PWM_PIN, 255 - duty) {
            warn!("hw pwm: {}", e);
        }
        Timer::after(Duration::from_millis(20)).await;
    }
}

/// Sweep the servo from 0 to 180 degrees and back
#[embassy_executor::task]
async fn servo_sweep_task(handle: ServoHandle) {
    let mut angle = 0i32;
    let mut step = 5i32;
    loop {
        if let Some(Err(e)) = SERVOS.with(|s| s.write(handle, angle)) {
            warn!("servo write: {}", e);
        }
        if !(0..=180).contains(&(angle + step)) {
            step = -step;
        }
        angle += step;
        Timer::after(Duration::from_millis(50)).await;
    }
}

/// Log one analog reading and the tick count every second
#[embassy_executor::task]
async fn analog_task(mut adc: AnalogReader<NrfSaadc, BoardPins>) {
    loop {
        match adc.read(ANALOG_PIN) {
            Ok(value) => info!(
                "AIN0 = {} ({}), ticks = {}",
                value,
                adc.read_resolution(),
                TICKS.load(Ordering::Relaxed)
            ),
            Err(e) => warn!("analog read: {}", e),
        }
        Timer::after(Duration::from_secs(1)).await;
    }
}
