use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::frame::Frame;
use crate::ready::WaitOutcome;
use crate::{Ad7190, Error, Register};

/// Chip select held low across several transactions.
///
/// Conversions and calibrations need CS to stay asserted between the mode
/// write, the DOUT/RDY wait and the data read. The guard deasserts CS on
/// [`Selected::release`], or on drop if an error cut the sequence short.
pub struct Selected<'a, SPI, CS: OutputPin, RDY, D> {
  adc: &'a mut Ad7190<SPI, CS, RDY, D>,
  released: bool,
}

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  /// Assert chip select and keep it asserted for the lifetime of the guard.
  pub fn select(&mut self) -> Result<Selected<'_, SPI, CS, RDY, D>, Error<E>> {
    self.cs.set_low().map_err(|_| Error::Pin)?;
    Ok(Selected { adc: self, released: false })
  }

  /// Write a register in its own chip-select window.
  pub fn write_register(&mut self, reg: Register, value: u32) -> Result<(), Error<E>> {
    self.write_raw(reg.address(), value, reg.width())
  }

  /// Read a register in its own chip-select window.
  pub fn read_register(&mut self, reg: Register) -> Result<u32, Error<E>> {
    self.read_raw(reg.address(), reg.width())
  }

  /// Write `width` bytes of `value` to an arbitrary register address.
  ///
  /// `width` is not checked against the register map; it only bounds how many
  /// bytes of `value` go out.
  pub fn write_raw(&mut self, address: u8, value: u32, width: usize) -> Result<(), Error<E>> {
    let mut selected = self.select()?;
    selected.write_frame(&Frame::write(address, value, width))?;
    selected.release()
  }

  /// Read `width` bytes from an arbitrary register address.
  pub fn read_raw(&mut self, address: u8, width: usize) -> Result<u32, Error<E>> {
    let mut selected = self.select()?;
    let mut frame = Frame::read(address, width);
    selected.exchange_frame(&mut frame)?;
    selected.release()?;
    Ok(frame.value())
  }

  fn bus_write(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
    self.spi.write(bytes).map_err(Error::Spi)?;
    self.spi.flush().map_err(Error::Spi)
  }

  fn bus_exchange(&mut self, bytes: &mut [u8]) -> Result<(), Error<E>> {
    self.spi.transfer_in_place(bytes).map_err(Error::Spi)?;
    self.spi.flush().map_err(Error::Spi)
  }
}

impl<SPI, CS, RDY, D, E> Selected<'_, SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  pub fn write_register(&mut self, reg: Register, value: u32) -> Result<(), Error<E>> {
    self.write_frame(&Frame::write(reg.address(), value, reg.width()))
  }

  pub fn read_register(&mut self, reg: Register) -> Result<u32, Error<E>> {
    let mut frame = Frame::read(reg.address(), reg.width());
    self.exchange_frame(&mut frame)?;
    Ok(frame.value())
  }

  /// Wait for DOUT/RDY, then read the data register.
  pub fn read_sample(&mut self) -> Result<u32, Error<E>> {
    self.wait_ready()?;
    self.read_register(Register::Data)
  }

  /// Poll DOUT/RDY once through the configured budget and report the outcome
  /// without applying the timeout policy.
  pub fn poll_ready(&mut self) -> Result<WaitOutcome, Error<E>> {
    self.adc.poll_ready()
  }

  /// Wait for DOUT/RDY, honouring the configured timeout policy.
  pub fn wait_ready(&mut self) -> Result<(), Error<E>> {
    self.adc.wait_ready()
  }

  /// Deassert chip select, reporting a pin failure.
  pub fn release(mut self) -> Result<(), Error<E>> {
    self.released = true;
    self.adc.cs.set_high().map_err(|_| Error::Pin)
  }

  pub(crate) fn write_frame(&mut self, frame: &Frame) -> Result<(), Error<E>> {
    trace!("write {=[u8]:#x}", frame.as_bytes());
    self.adc.bus_write(frame.as_bytes())
  }

  pub(crate) fn exchange_frame(&mut self, frame: &mut Frame) -> Result<(), Error<E>> {
    self.adc.bus_exchange(frame.as_mut_bytes())?;
    trace!("read {=[u8]:#x}", frame.as_bytes());
    Ok(())
  }

  pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
    self.adc.bus_write(bytes)
  }
}

impl<SPI, CS: OutputPin, RDY, D> Drop for Selected<'_, SPI, CS, RDY, D> {
  fn drop(&mut self) {
    if !self.released {
      let _ = self.adc.cs.set_high();
    }
  }
}
