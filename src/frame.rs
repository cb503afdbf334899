//! Command framing for register transactions.
//!
//! Every transaction is a single command byte followed by `width` payload
//! bytes, most significant first. Reads are clocked out in place: the command
//! byte goes out and the register contents come back in the payload slots.

use crate::reg::{Command, MAX_PAYLOAD};

/// A command byte plus up to [`MAX_PAYLOAD`] payload bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
  buf: [u8; MAX_PAYLOAD + 1],
  width: usize,
}

impl Frame {
  /// Frame writing the low `width` bytes of `value` to `address`.
  ///
  /// Bytes above `width` are dropped. Widths beyond [`MAX_PAYLOAD`] are clamped.
  pub fn write(address: u8, value: u32, width: usize) -> Self {
    let width = width.min(MAX_PAYLOAD);
    let mut buf = [0u8; MAX_PAYLOAD + 1];
    buf[0] = Command::for_write(address).into_bits();

    let be = value.to_be_bytes();
    buf[1..=width].copy_from_slice(&be[be.len() - width..]);

    Self { buf, width }
  }

  /// Frame reading `width` bytes from `address`. Payload slots start zeroed.
  pub fn read(address: u8, width: usize) -> Self {
    let width = width.min(MAX_PAYLOAD);
    let mut buf = [0u8; MAX_PAYLOAD + 1];
    buf[0] = Command::for_read(address).into_bits();
    Self { buf, width }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn command(&self) -> u8 {
    self.buf[0]
  }

  /// Bytes to put on the bus; always `width + 1` long.
  pub fn as_bytes(&self) -> &[u8] {
    &self.buf[..=self.width]
  }

  pub fn as_mut_bytes(&mut self) -> &mut [u8] {
    &mut self.buf[..=self.width]
  }

  /// Reassemble the payload returned by a read exchange, MSB first.
  pub fn value(&self) -> u32 {
    self.buf[1..=self.width].iter().fold(0u32, |acc, &b| (acc << 8) + b as u32)
  }
}
