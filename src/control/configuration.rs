use bitfield_struct::bitfield;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::{Ad7190, Error, Register};

/// Configuration register (24 bits, held in the low bits of a `u32`).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigWord {
  /// G2..G0; see [`Gain`].
  #[bits(3)]
  pub gain: u8,
  /// U/B: set for unipolar, clear for bipolar.
  pub unipolar: bool,
  /// Buffer the analog inputs.
  pub buffer: bool,
  __: bool,
  /// Flag NOREF when the reference goes missing.
  pub reference_detect: bool,
  /// 500 nA burnout currents on the selected channel.
  pub burnout: bool,
  /// CH7..CH0, one bit per [`Channel`]; several may be enabled for sequencing.
  #[bits(8)]
  pub channels: u8,
  #[bits(4)]
  ___: u8,
  /// REFSEL: use REFIN2 instead of REFIN1.
  pub reference_2: bool,
  #[bits(2)]
  ____: u8,
  pub chop: bool,
  #[bits(8)]
  _____: u8,
}

impl ConfigWord {
  pub const fn bits24(self) -> u32 {
    self.into_bits() & 0x00FF_FFFF
  }

  pub const fn polarity(self) -> Polarity {
    if self.unipolar() {
      Polarity::Unipolar
    } else {
      Polarity::Bipolar
    }
  }

  pub const fn with_polarity(self, polarity: Polarity) -> Self {
    self.with_unipolar(matches!(polarity, Polarity::Unipolar))
  }

  pub const fn with_gain_setting(self, gain: Gain) -> Self {
    self.with_gain(gain.into_bits())
  }

  /// `None` for the reserved codes 1 and 2.
  pub const fn gain_setting(self) -> Option<Gain> {
    Gain::from_bits(self.gain())
  }

  /// Enable exactly one channel.
  pub const fn with_channel(self, channel: Channel) -> Self {
    self.with_channels(channel.mask())
  }
}

/// Programmable gain and the input range it gives with a given reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
  /// ±5 V range with a 5 V reference.
  X1 = 0b000,
  X8 = 0b011,
  X16 = 0b100,
  X32 = 0b101,
  X64 = 0b110,
  /// ±39.06 mV range with a 5 V reference.
  X128 = 0b111,
}

impl Gain {
  pub const fn into_bits(self) -> u8 {
    self as _
  }

  pub const fn from_bits(bits: u8) -> Option<Self> {
    match bits & 0b111 {
      0b000 => Some(Self::X1),
      0b011 => Some(Self::X8),
      0b100 => Some(Self::X16),
      0b101 => Some(Self::X32),
      0b110 => Some(Self::X64),
      0b111 => Some(Self::X128),
      _ => None,
    }
  }

  /// Numeric gain factor.
  pub const fn factor(self) -> u8 {
    match self {
      Self::X1 => 1,
      Self::X8 => 8,
      Self::X16 => 16,
      Self::X32 => 32,
      Self::X64 => 64,
      Self::X128 => 128,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
  Bipolar,
  Unipolar,
}

/// Input channels. The discriminant is the bit index in the channel mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
  Ain1Ain2 = 0,
  Ain3Ain4 = 1,
  TemperatureSensor = 2,
  /// AIN2 against itself, for noise and offset checks.
  Ain2Ain2 = 3,
  Ain1Com = 4,
  Ain2Com = 5,
  Ain3Com = 6,
  Ain4Com = 7,
}

impl Channel {
  pub const fn index(self) -> u8 {
    self as u8
  }

  pub const fn mask(self) -> u8 {
    1 << self.index()
  }

  /// Iterate over all channels.
  pub fn all() -> impl Iterator<Item = Self> {
    [
      Self::Ain1Ain2,
      Self::Ain3Ain4,
      Self::TemperatureSensor,
      Self::Ain2Ain2,
      Self::Ain1Com,
      Self::Ain2Com,
      Self::Ain3Com,
      Self::Ain4Com,
    ]
    .into_iter()
  }
}

impl TryFrom<u8> for Channel {
  type Error = ();

  fn try_from(index: u8) -> Result<Self, Self::Error> {
    Self::all().nth(index as usize).ok_or(())
  }
}

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  pub fn configuration(&mut self) -> Result<ConfigWord, Error<E>> {
    Ok(ConfigWord::from_bits(self.read_register(Register::Configuration)?))
  }

  pub fn set_configuration(&mut self, config: ConfigWord) -> Result<(), Error<E>> {
    self.write_register(Register::Configuration, config.bits24())
  }

  /// Read the configuration register, let `f` change fields, write it back.
  pub fn modify_configuration<F: FnOnce(&mut ConfigWord)>(&mut self, f: F) -> Result<ConfigWord, Error<E>> {
    let mut config = self.configuration()?;
    f(&mut config);
    self.set_configuration(config)?;
    Ok(config)
  }
}
