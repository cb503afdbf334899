/******************************************************************************
 * Refer to AD7190 datasheet for more information, available here:            *
 * - https://www.analog.com/media/en/technical-documentation/data-sheets/     *
 * ========================================================================== *
 *                        AD7190 - Registers & Memory Map                     *
*******************************************************************************/

use bitfield_struct::bitfield;

/// Value of the ID register on a genuine part.
pub(crate) const PART_ID: u8 = 0xA6;

/// Synchronization pattern; 40+ consecutive ones reset the serial interface.
pub(crate) const RESET_PATTERN: [u8; 7] = [0xFF; 7];

/// Largest payload a raw register frame can carry.
pub const MAX_PAYLOAD: usize = 4;

/// On-chip registers addressable through the communications register.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
  /// Read-only status. Shares address 0 with the write-only communications register.
  Status = 0,
  Mode = 1,
  Configuration = 2,
  Data = 3,
  Id = 4,
  /// General-purpose digital outputs.
  Gpocon = 5,
  Offset = 6,
  FullScale = 7,
}

/// Whether a register accepts reads, writes or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
  ReadOnly,
  ReadWrite,
}

impl Register {
  /// Payload width in bytes.
  pub const fn width(self) -> usize {
    match self {
      Self::Status | Self::Id | Self::Gpocon => 1,
      Self::Mode | Self::Configuration | Self::Data | Self::Offset | Self::FullScale => 3,
    }
  }

  pub const fn access(self) -> Access {
    match self {
      Self::Status | Self::Data | Self::Id => Access::ReadOnly,
      _ => Access::ReadWrite,
    }
  }

  /// Register at a communications-register address, if any.
  pub const fn from_address(address: u8) -> Option<Self> {
    Some(match address {
      0 => Self::Status,
      1 => Self::Mode,
      2 => Self::Configuration,
      3 => Self::Data,
      4 => Self::Id,
      5 => Self::Gpocon,
      6 => Self::Offset,
      7 => Self::FullScale,
      _ => return None,
    })
  }

  pub const fn address(self) -> u8 {
    self as u8
  }
}

impl From<Register> for u8 {
  #[inline]
  fn from(r: Register) -> Self {
    r as u8
  }
}

/// Communications register, the first byte of every frame.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub(crate) struct Command {
  #[bits(2)]
  __: u8,
  /// Continuous read of the data register.
  pub(crate) cread: bool,
  #[bits(3)]
  pub(crate) address: u8,
  pub(crate) read: bool,
  /// WEN; must be clear for the part to accept the command.
  pub(crate) write_disable: bool,
}

impl Command {
  pub(crate) const fn for_read(address: u8) -> Self {
    Self::new().with_address(address & 0x07).with_read(true)
  }

  pub(crate) const fn for_write(address: u8) -> Self {
    Self::new().with_address(address & 0x07)
  }
}
