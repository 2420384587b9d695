//! Analog Input Tests
//!
//! Tests for AIN lookup, hardware resolution selection and the blocking
//! conversion sequences of the nRF51 ADC and nRF52 SAADC.
//! Run with: cargo test --no-default-features --features std --test analog_tests

use nrf5_bsp::analog::{AdcFamily, AnalogReader, SpinLimit};
use nrf5_bsp::board::BoardPins;
use nrf5_bsp::hal::adc::{AdcTask, AnalogInput};
use nrf5_bsp::hal::sim::SimAdc;
use nrf5_bsp::types::PhysicalPin;
use nrf5_bsp::Error;

fn pin(n: u8) -> PhysicalPin {
    PhysicalPin::new(n).unwrap()
}

fn saadc() -> (SimAdc, AnalogReader<SimAdc, BoardPins>) {
    let adc = SimAdc::saadc();
    let reader = AnalogReader::new(adc.clone(), BoardPins::IDENTITY, AdcFamily::Nrf52Saadc);
    (adc, reader)
}

// =============================================================================
// AIN Mapping Tests
// =============================================================================

#[test]
fn nrf52_ain_pins() {
    let family = AdcFamily::Nrf52Saadc;
    let expected = [2, 3, 4, 5, 28, 29, 30, 31];
    for (ain, gpio) in expected.into_iter().enumerate() {
        let input = family.analog_input(pin(gpio)).unwrap();
        assert_eq!(usize::from(input.index()), ain);
    }
    assert!(family.analog_input(pin(0)).is_none());
    assert!(family.analog_input(pin(17)).is_none());
}

#[test]
fn nrf51_ain_pins() {
    let family = AdcFamily::Nrf51Adc;
    assert_eq!(family.analog_input(pin(26)), AnalogInput::new(0));
    assert_eq!(family.analog_input(pin(1)), AnalogInput::new(2));
    assert_eq!(family.analog_input(pin(6)), AnalogInput::new(7));
    assert!(family.analog_input(pin(28)).is_none());
}

#[test]
fn hardware_bits_round_up() {
    let saadc = AdcFamily::Nrf52Saadc;
    assert_eq!(saadc.hardware_bits(1), 8);
    assert_eq!(saadc.hardware_bits(10), 10);
    assert_eq!(saadc.hardware_bits(11), 12);
    assert_eq!(saadc.hardware_bits(16), 14);

    let adc = AdcFamily::Nrf51Adc;
    assert_eq!(adc.hardware_bits(8), 8);
    assert_eq!(adc.hardware_bits(9), 9);
    assert_eq!(adc.hardware_bits(12), 10);
}

// =============================================================================
// SAADC Read Tests
// =============================================================================

#[test]
fn saadc_read_sequence() {
    let (adc, mut reader) = saadc();
    adc.set_sample(700);
    assert_eq!(reader.read(4), Ok(700));

    assert_eq!(adc.input(), AnalogInput::new(2));
    assert_eq!(adc.bits(), 10);
    assert_eq!(adc.tasks(), vec![AdcTask::Start, AdcTask::Sample, AdcTask::Stop]);
    assert!(!adc.is_enabled());
    assert!(!adc.events_pending());
}

#[test]
fn read_resolution_maps_result() {
    let (adc, mut reader) = saadc();

    // 16 bits requested, SAADC samples at 14
    reader.set_read_resolution(16).unwrap();
    adc.set_sample(1000);
    assert_eq!(reader.read(2), Ok(4000));
    assert_eq!(adc.bits(), 14);

    // 4 bits requested, SAADC samples at 8
    reader.set_read_resolution(4).unwrap();
    adc.set_sample(255);
    assert_eq!(reader.read(2), Ok(15));
    assert_eq!(adc.bits(), 8);

    reader.set_read_resolution(12).unwrap();
    adc.set_sample(4095);
    assert_eq!(reader.read(2), Ok(4095));
    assert_eq!(reader.read_resolution().bits(), 12);
}

#[test]
fn invalid_read_resolution_rejected() {
    let (_adc, mut reader) = saadc();
    assert_eq!(reader.set_read_resolution(0), Err(Error::InvalidResolution(0)));
    assert_eq!(reader.set_read_resolution(20), Err(Error::InvalidResolution(20)));
    assert_eq!(reader.read_resolution().bits(), 10);
}

#[test]
fn negative_sample_reads_zero() {
    let (adc, mut reader) = saadc();
    adc.set_sample(-12);
    assert_eq!(reader.read(2), Ok(0));
}

#[test]
fn digital_pin_rejected() {
    let (adc, mut reader) = saadc();
    assert_eq!(reader.read(17), Err(Error::NotAnalogInput(pin(17))));
    assert_eq!(reader.read(60), Err(Error::InvalidPin(60)));
    assert!(adc.tasks().is_empty());
}

#[test]
fn stuck_converter_times_out() {
    let adc = SimAdc::saadc();
    adc.set_responsive(false);
    let mut reader = AnalogReader::new(adc.clone(), BoardPins::IDENTITY, AdcFamily::Nrf52Saadc)
        .with_spin_limit(SpinLimit::Bounded(100));

    assert_eq!(reader.read(2), Err(Error::AdcTimeout));
    assert!(!adc.is_enabled());
    assert_eq!(adc.tasks(), vec![AdcTask::Start, AdcTask::Stop]);
}

// =============================================================================
// nRF51 ADC Read Tests
// =============================================================================

#[test]
fn nrf51_read_sequence() {
    let adc = SimAdc::nrf51();
    let mut reader = AnalogReader::new(adc.clone(), BoardPins::IDENTITY, AdcFamily::Nrf51Adc);
    adc.set_sample(512);

    assert_eq!(reader.read(27), Ok(512));
    assert_eq!(adc.input(), AnalogInput::new(1));
    assert_eq!(adc.bits(), 10);
    assert_eq!(adc.tasks(), vec![AdcTask::Start, AdcTask::Stop]);
    assert!(!adc.is_enabled());
}

#[test]
fn nrf51_eight_bit_read() {
    let adc = SimAdc::nrf51();
    let mut reader = AnalogReader::new(adc.clone(), BoardPins::IDENTITY, AdcFamily::Nrf51Adc);
    reader.set_read_resolution(8).unwrap();
    adc.set_sample(200);
    assert_eq!(reader.read(26), Ok(200));
    assert_eq!(adc.bits(), 8);
}
