use bitfield_struct::bitfield;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::{Ad7190, Error, Register};

pub const RATE_MASK: u16 = 0x3FF;

/// Mode register (24 bits, held in the low bits of a `u32`).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeWord {
  /// Filter output word FS9..FS0; output rate is `f_clk / 1024 / rate`.
  #[bits(10)]
  pub rate: u16,
  /// Extra 60 Hz notch when the first notch sits at 50 Hz.
  pub reject_60hz: bool,
  /// Settle in a single conversion cycle after a channel change.
  pub single_cycle: bool,
  __: bool,
  /// Parity over the data register, reported in the status byte.
  pub parity: bool,
  ___: bool,
  /// Use the sinc3 filter instead of sinc4.
  pub sinc3: bool,
  #[bits(2)]
  ____: u8,
  #[bits(2)]
  pub clock: ClockSource,
  /// DAT_STA. Data reads are framed at three bytes, so the driver keeps this clear.
  pub(crate) status_append: bool,
  #[bits(3)]
  pub operating_mode: OperatingMode,
  #[bits(8)]
  _____: u8,
}

/// MD2..MD0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingMode {
  Continuous = 0b000,
  Single = 0b001,
  Idle = 0b010,
  PowerDown = 0b011,
  InternalZeroScale = 0b100,
  InternalFullScale = 0b101,
  SystemZeroScale = 0b110,
  SystemFullScale = 0b111,
}

impl OperatingMode {
  pub const fn into_bits(self) -> u8 {
    self as _
  }

  pub const fn from_bits(bits: u8) -> Self {
    match bits & 0b111 {
      0b000 => Self::Continuous,
      0b001 => Self::Single,
      0b010 => Self::Idle,
      0b011 => Self::PowerDown,
      0b100 => Self::InternalZeroScale,
      0b101 => Self::InternalFullScale,
      0b110 => Self::SystemZeroScale,
      _ => Self::SystemFullScale,
    }
  }
}

/// CLK1..CLK0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockSource {
  /// Crystal between MCLK1 and MCLK2.
  ExternalCrystal = 0b00,
  /// External clock applied to MCLK2.
  ExternalClock = 0b01,
  /// Internal 4.92 MHz, MCLK2 tristated.
  Internal = 0b10,
  /// Internal 4.92 MHz, also driven out on MCLK2.
  InternalWithOutput = 0b11,
}

impl ClockSource {
  pub const fn into_bits(self) -> u8 {
    self as _
  }

  pub const fn from_bits(bits: u8) -> Self {
    match bits & 0b11 {
      0b00 => Self::ExternalCrystal,
      0b01 => Self::ExternalClock,
      0b10 => Self::Internal,
      _ => Self::InternalWithOutput,
    }
  }
}

/// Power states reachable through [`Ad7190::set_power`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
  Idle,
  PowerDown,
}

impl From<PowerMode> for OperatingMode {
  fn from(p: PowerMode) -> Self {
    match p {
      PowerMode::Idle => Self::Idle,
      PowerMode::PowerDown => Self::PowerDown,
    }
  }
}

/// Calibration routines, each a dedicated operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Calibration {
  InternalZeroScale,
  InternalFullScale,
  /// Needs the system zero-scale input applied to the channel.
  SystemZeroScale,
  /// Needs the system full-scale input applied to the channel.
  SystemFullScale,
}

impl From<Calibration> for OperatingMode {
  fn from(c: Calibration) -> Self {
    match c {
      Calibration::InternalZeroScale => Self::InternalZeroScale,
      Calibration::InternalFullScale => Self::InternalFullScale,
      Calibration::SystemZeroScale => Self::SystemZeroScale,
      Calibration::SystemFullScale => Self::SystemFullScale,
    }
  }
}

/// Filter options for [`Ad7190::start_continuous`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContinuousOptions {
  pub sinc3: bool,
  pub reject_60hz: bool,
  /// Skip the settling delay after a channel change (SINGLE bit).
  pub single_cycle: bool,
}

impl ModeWord {
  /// A mode word built from scratch: operating mode, clock and rate, every
  /// other bit clear.
  pub const fn command(mode: OperatingMode, clock: ClockSource, rate: u16) -> Self {
    Self::new().with_operating_mode(mode).with_clock(clock).with_rate(rate & RATE_MASK)
  }

  /// Value as written to the 24-bit register.
  pub const fn bits24(self) -> u32 {
    self.into_bits() & 0x00FF_FFFF
  }
}

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  pub fn mode(&mut self) -> Result<ModeWord, Error<E>> {
    Ok(ModeWord::from_bits(self.read_register(Register::Mode)?))
  }

  /// Write the mode register. DAT_STA is always written clear.
  pub fn set_mode(&mut self, mode: ModeWord) -> Result<(), Error<E>> {
    self.write_register(Register::Mode, mode.with_status_append(false).bits24())
  }

  /// Read the mode register, let `f` change fields, write it back.
  pub fn modify_mode<F: FnOnce(&mut ModeWord)>(&mut self, f: F) -> Result<ModeWord, Error<E>> {
    let mut mode = self.mode()?;
    f(&mut mode);
    self.set_mode(mode)?;
    Ok(mode)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL_SET: u32 = 0x00FF_FFFF;

  #[test]
  fn field_positions() {
    assert_eq!(ModeWord::new().with_operating_mode(OperatingMode::SystemFullScale).into_bits(), 0x7 << 21);
    assert_eq!(ModeWord::new().with_status_append(true).into_bits(), 1 << 20);
    assert_eq!(ModeWord::new().with_clock(ClockSource::InternalWithOutput).into_bits(), 0x3 << 18);
    assert_eq!(ModeWord::new().with_sinc3(true).into_bits(), 1 << 15);
    assert_eq!(ModeWord::new().with_parity(true).into_bits(), 1 << 13);
    assert_eq!(ModeWord::new().with_single_cycle(true).into_bits(), 1 << 11);
    assert_eq!(ModeWord::new().with_reject_60hz(true).into_bits(), 1 << 10);
    assert_eq!(ModeWord::new().with_rate(0x3FF).into_bits(), 0x3FF);
  }

  #[test]
  fn single_conversion_command_matches_register_value() {
    let cmd = ModeWord::command(OperatingMode::Single, ClockSource::ExternalClock, 0x060);
    assert_eq!(cmd.bits24(), (1 << 21) | (1 << 18) | 0x060);
  }

  #[test]
  fn command_masks_rate() {
    let cmd = ModeWord::command(OperatingMode::Continuous, ClockSource::ExternalCrystal, 0xFFFF);
    assert_eq!(cmd.rate(), 0x3FF);
    assert_eq!(cmd.operating_mode(), OperatingMode::Continuous);
  }

  // Each replacement must touch only its own field.
  fn assert_only_changes(before: ModeWord, after: ModeWord, field_mask: u32) {
    assert_eq!(before.into_bits() & !field_mask, after.into_bits() & !field_mask);
  }

  #[test]
  fn field_updates_preserve_other_bits() {
    for seed in [0u32, ALL_SET, 0x00A5_5A5A, 0x005A_A5A5] {
      let w = ModeWord::from_bits(seed);

      assert_only_changes(w, w.with_operating_mode(OperatingMode::Idle), 0x7 << 21);
      assert_only_changes(w, w.with_operating_mode(OperatingMode::InternalFullScale), 0x7 << 21);
      assert_only_changes(w, w.with_rate(0x123), 0x3FF);
      assert_only_changes(w, w.with_clock(ClockSource::Internal), 0x3 << 18);
      assert_only_changes(w, w.with_sinc3(!w.sinc3()), 1 << 15);
      assert_only_changes(w, w.with_reject_60hz(!w.reject_60hz()), 1 << 10);
      assert_only_changes(w, w.with_single_cycle(!w.single_cycle()), 1 << 11);
    }
  }

  #[test]
  fn updates_land_in_their_field() {
    let w = ModeWord::from_bits(ALL_SET).with_operating_mode(OperatingMode::PowerDown);
    assert_eq!(w.bits24(), (ALL_SET & !(0x7 << 21)) | (0x3 << 21));

    let w = ModeWord::from_bits(0).with_clock(ClockSource::ExternalClock).with_rate(0x060);
    assert_eq!(w.bits24(), (1 << 18) | 0x060);
  }

  #[test]
  fn power_and_calibration_codes() {
    assert_eq!(OperatingMode::from(PowerMode::Idle).into_bits(), 2);
    assert_eq!(OperatingMode::from(PowerMode::PowerDown).into_bits(), 3);
    assert_eq!(OperatingMode::from(Calibration::InternalZeroScale).into_bits(), 4);
    assert_eq!(OperatingMode::from(Calibration::InternalFullScale).into_bits(), 5);
    assert_eq!(OperatingMode::from(Calibration::SystemZeroScale).into_bits(), 6);
    assert_eq!(OperatingMode::from(Calibration::SystemFullScale).into_bits(), 7);
  }

  #[test]
  fn set_mode_never_enables_status_append() {
    let sim = crate::sim::Sim::new();
    let mut adc = sim.driver(crate::Config::default());

    adc.set_mode(ModeWord::from_bits(ALL_SET)).unwrap();
    assert_eq!(sim.register(Register::Mode), ALL_SET & !(1 << 20));

    adc.modify_mode(|m| m.set_status_append(true)).unwrap();
    assert!(!adc.mode().unwrap().status_append());

    sim.queue_samples(&[0x12_3456, 0x65_4321]);
    assert_eq!(adc.single_conversion(), Ok(0x12_3456));
  }
}
