#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Blocking, `no_std` driver for the Analog Devices AD7190 4.8 kHz, ultralow
//! noise, 24-bit sigma-delta ADC.
//!
//! The part is driven over SPI with chip select and the DOUT/RDY line handled
//! by the driver, because conversions and calibrations need chip select held
//! across several register transactions. This crate exposes:
//!
//! - Typed mode and configuration words with field-wise updates instead of
//!   raw shift-and-mask arithmetic
//! - Reset and identity check, power states, channel and range selection
//! - Internal and system calibration
//! - Single conversions, averaged reads and the on-chip temperature sensor
//! - Continuous sampling packed into 4-byte (or 8-byte timestamped) records
//!   for a 7-bit-clean host link
//! - `embedded-hal` 1.0 traits so the driver works across MCU families
//!
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::{InputPin, OutputPin}, spi::SpiBus};
//! use ad7190::{Ad7190, Config, ContinuousOptions, Gain, Polarity, Channel};
//!
//! fn example<SPI, CS, RDY, D, E>(spi: SPI, cs: CS, rdy: RDY, delay: D) -> Result<(), ad7190::Error<E>>
//! where
//!   SPI: SpiBus<u8, Error = E>,
//!   CS: OutputPin,
//!   RDY: InputPin,
//!   D: DelayNs,
//! {
//!   let mut adc = Ad7190::new(spi, cs, rdy, delay, Config::default());
//!   adc.init()?;
//!   adc.setup_range(Polarity::Bipolar, false, Gain::X128)?;
//!   adc.select_channel(Channel::Ain1Ain2)?;
//!
//!   adc.start_continuous(0x060, ContinuousOptions::default())?;
//!   let mut buf = [0u8; 4 * 16];
//!   adc.read_continuous(16, &mut buf)?;
//!   Ok(())
//! }
//! ```

#[macro_use]
mod fmt;

mod config;
mod control;
mod frame;
mod ready;
mod reg;
mod rw;
mod stream;

#[cfg(test)]
mod sim;

pub use config::*;
pub use control::*;
pub use frame::Frame;
pub use ready::{ReadyTimeout, TimeoutPolicy, WaitOutcome, DEFAULT_READY_POLLS};
pub use reg::{Access, Register, MAX_PAYLOAD};
pub use rw::Selected;
pub use stream::*;

/// Errors that can occur while talking to the converter.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// SPI bus transaction failed with the underlying driver error.
  Spi(E),
  /// Chip select or DOUT/RDY pin access failed.
  Pin,
  /// The ID register held something other than the AD7190 identity.
  InvalidId(u8),
  /// DOUT/RDY stayed high for the whole wait budget under [`TimeoutPolicy::Fail`].
  NotReady,
  /// The output buffer cannot hold the requested number of packed samples.
  BufferTooSmall { required: usize, provided: usize },
  /// An average over zero samples was requested.
  NoSamples,
}

/// AD7190 on an SPI bus with a dedicated chip select and DOUT/RDY input.
///
/// Construct with [`Ad7190::new`], call [`Ad7190::init`] to reset and verify
/// the part, then configure and convert. All operations block until the bus
/// transactions and ready waits they involve complete.
pub struct Ad7190<SPI, CS, RDY, D> {
  spi: SPI,
  cs: CS,
  rdy: RDY,
  delay: D,
  config: Config,
}

impl<SPI, CS, RDY, D> Ad7190<SPI, CS, RDY, D> {
  /// Create a driver instance. Nothing is sent until the first operation.
  ///
  /// `rdy` must read the DOUT/RDY line, which on most boards is the MISO pin
  /// of `spi` configured as an input as well.
  pub fn new(spi: SPI, cs: CS, rdy: RDY, delay: D, config: Config) -> Self {
    Self { spi, cs, rdy, delay, config }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn set_config(&mut self, config: Config) {
    self.config = config;
  }

  /// Give back the bus, pins and delay.
  pub fn release(self) -> (SPI, CS, RDY, D) {
    (self.spi, self.cs, self.rdy, self.delay)
  }
}
