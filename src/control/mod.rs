use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::reg::{PART_ID, RESET_PATTERN};
use crate::{Ad7190, Error, Register};

mod configuration;
mod mode;
mod status;

pub use configuration::*;
pub use mode::*;
pub use status::*;

/// Data code at 0 K is offset by mid-scale; the sensor gives 2815 codes per kelvin.
const TEMP_ZERO_CODE: u32 = 0x80_0000;
const TEMP_CODES_PER_KELVIN: u32 = 2815;
const KELVIN_OFFSET: u32 = 273;

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  /// Reset the serial interface and all registers by clocking in the
  /// synchronization pattern.
  pub fn reset(&mut self) -> Result<(), Error<E>> {
    let mut selected = self.select()?;
    selected.write_bytes(&RESET_PATTERN)?;
    selected.release()
  }

  /// Reset the part, wait for it to settle and verify its identity.
  ///
  /// Fails with [`Error::InvalidId`] if anything other than an AD7190
  /// answers. No retry is attempted.
  pub fn init(&mut self) -> Result<(), Error<E>> {
    self.reset()?;
    self.delay.delay_ms(self.config.reset_settle_ms);

    let id = self.id()?;
    debug!("ID register reads {:#x}", id);
    if id != PART_ID {
      return Err(Error::InvalidId(id));
    }
    Ok(())
  }

  /// Put the modulator into idle or power-down, keeping every other mode bit.
  pub fn set_power(&mut self, power: PowerMode) -> Result<(), Error<E>> {
    self.modify_mode(|m| m.set_operating_mode(power.into()))?;
    Ok(())
  }

  /// Enable a single input channel, disabling the rest.
  pub fn select_channel(&mut self, channel: Channel) -> Result<(), Error<E>> {
    self.modify_configuration(|c| c.set_channels(channel.mask()))?;
    Ok(())
  }

  /// Set input polarity, chopping and gain in one register update.
  pub fn setup_range(&mut self, polarity: Polarity, chop: bool, gain: Gain) -> Result<(), Error<E>> {
    self.modify_configuration(|c| {
      *c = c.with_polarity(polarity).with_chop(chop).with_gain_setting(gain);
    })?;
    Ok(())
  }

  /// Run a calibration on `channel` and block until the part reports it done.
  pub fn calibrate(&mut self, calibration: Calibration, channel: Channel) -> Result<(), Error<E>> {
    self.select_channel(channel)?;
    let mode = self.mode()?.with_operating_mode(calibration.into());

    debug!("calibrating {} on {}", calibration, channel);
    let mut selected = self.select()?;
    selected.write_register(Register::Mode, mode.bits24())?;
    selected.wait_ready()?;
    selected.release()
  }

  /// Trigger one conversion with the configured clock and rate and return the
  /// raw 24-bit result.
  ///
  /// The mode word is built from scratch, so filter flags set earlier are
  /// cleared.
  pub fn single_conversion(&mut self) -> Result<u32, Error<E>> {
    let command = ModeWord::command(OperatingMode::Single, self.config.clock, self.config.rate);

    let mut selected = self.select()?;
    selected.write_register(Register::Mode, command.bits24())?;
    let sample = selected.read_sample()?;
    selected.release()?;
    Ok(sample)
  }

  /// Arm continuous conversion at `rate` with the configured clock.
  ///
  /// Only the mode is written; samples are pulled with
  /// [`Ad7190::read_continuous`] and friends. The part keeps converting until
  /// [`Ad7190::stop_continuous`] or another mode write, whether or not
  /// anything reads the results.
  pub fn start_continuous(&mut self, rate: u16, options: ContinuousOptions) -> Result<(), Error<E>> {
    let command = ModeWord::command(OperatingMode::Continuous, self.config.clock, rate)
      .with_sinc3(options.sinc3)
      .with_reject_60hz(options.reject_60hz)
      .with_single_cycle(options.single_cycle);

    trace!("continuous mode word {:#x}", command.bits24());
    let mut selected = self.select()?;
    selected.write_register(Register::Mode, command.bits24())?;
    selected.release()
  }

  /// Leave continuous mode by switching the modulator to idle.
  pub fn stop_continuous(&mut self) -> Result<(), Error<E>> {
    self.set_power(PowerMode::Idle)
  }

  /// Arm continuous mode, take `count` samples and return their truncated mean.
  pub fn continuous_read_average(&mut self, count: u8) -> Result<u32, Error<E>> {
    if count == 0 {
      return Err(Error::NoSamples);
    }
    let command = ModeWord::command(OperatingMode::Continuous, self.config.clock, self.config.rate);

    let mut selected = self.select()?;
    selected.write_register(Register::Mode, command.bits24())?;
    let mut sum = 0u32;
    for _ in 0..count {
      sum += selected.read_sample()?;
    }
    selected.release()?;

    Ok(sum / count as u32)
  }

  /// Read the on-chip temperature sensor in whole degrees Celsius.
  ///
  /// Leaves the part configured for bipolar, unchopped, gain 1 on the
  /// temperature channel. The arithmetic is unsigned and the result is a
  /// `u8`, so readings below 0 °C wrap instead of going negative.
  pub fn temperature(&mut self) -> Result<u8, Error<E>> {
    self.setup_range(Polarity::Bipolar, false, Gain::X1)?;
    self.select_channel(Channel::TemperatureSensor)?;
    let raw = self.single_conversion()?;
    Ok(celsius_from_raw(raw))
  }
}

pub(crate) fn celsius_from_raw(raw: u32) -> u8 {
  let kelvin = raw.wrapping_sub(TEMP_ZERO_CODE) / TEMP_CODES_PER_KELVIN;
  kelvin.wrapping_sub(KELVIN_OFFSET) as u8
}
