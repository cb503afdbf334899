use bitfield_struct::bitfield;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::{Ad7190, Error, Register};

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
  /// Channel the current data register contents came from.
  #[bits(3)]
  pub channel: u8,
  __: bool,
  /// Odd number of ones in the data register (with ENPAR set).
  pub parity: bool,
  pub no_reference: bool,
  /// Result clamped to all zeros or all ones, or calibration overflow.
  pub error: bool,
  /// RDY bit, active low: clear once a conversion is waiting in the data register.
  pub busy: bool,
}

impl Status {
  pub const fn data_ready(self) -> bool {
    !self.busy()
  }
}

/// General-purpose output control.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gpocon {
  /// P3DAT..P0DAT, bit n drives Pn.
  #[bits(4)]
  pub outputs: u8,
  /// Enable P0 and P1 as outputs.
  pub p1_p0_enable: bool,
  /// Enable P2 and P3 as outputs.
  pub p3_p2_enable: bool,
  /// Close the bridge power-down switch between BPDSW and AGND.
  pub bridge_switch: bool,
  __: bool,
}

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  pub fn status(&mut self) -> Result<Status, Error<E>> {
    Ok(Status::from_bits(self.read_register(Register::Status)? as u8))
  }

  /// Raw ID register. A genuine part reads `0xA6`.
  pub fn id(&mut self) -> Result<u8, Error<E>> {
    Ok(self.read_register(Register::Id)? as u8)
  }

  pub fn gpocon(&mut self) -> Result<Gpocon, Error<E>> {
    Ok(Gpocon::from_bits(self.read_register(Register::Gpocon)? as u8))
  }

  pub fn set_gpocon(&mut self, gpocon: Gpocon) -> Result<(), Error<E>> {
    self.write_register(Register::Gpocon, gpocon.into_bits() as u32)
  }

  /// Offset calibration coefficient of the currently selected channel.
  pub fn offset(&mut self) -> Result<u32, Error<E>> {
    self.read_register(Register::Offset)
  }

  /// The part must be idle or powered down for the write to take.
  pub fn set_offset(&mut self, offset: u32) -> Result<(), Error<E>> {
    self.write_register(Register::Offset, offset)
  }

  /// Full-scale calibration coefficient of the currently selected channel.
  pub fn full_scale(&mut self) -> Result<u32, Error<E>> {
    self.read_register(Register::FullScale)
  }

  /// The part must be idle or powered down for the write to take.
  pub fn set_full_scale(&mut self, full_scale: u32) -> Result<(), Error<E>> {
    self.write_register(Register::FullScale, full_scale)
  }
}
