use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::{Ad7190, Error};

/// Iteration budget of the classic busy-wait on DOUT/RDY.
pub const DEFAULT_READY_POLLS: u32 = 0xF_FFFF;

/// How long to wait for DOUT/RDY to go low.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadyTimeout {
  /// Poll the line at most this many times, back to back. Needs no clock, so
  /// the real duration depends on core and pin read speed.
  Polls(u32),
  /// Poll roughly once per microsecond for at most this many microseconds.
  Micros(u32),
}

impl Default for ReadyTimeout {
  fn default() -> Self {
    Self::Polls(DEFAULT_READY_POLLS)
  }
}

/// What to do when the ready budget runs out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutPolicy {
  /// Log and carry on as if the line had asserted.
  #[default]
  Ignore,
  /// Abort the operation with [`Error::NotReady`].
  Fail,
}

/// Result of a single wait on DOUT/RDY.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitOutcome {
  /// The line went low within the budget.
  Ready,
  /// The budget ran out with the line still high.
  Expired,
}

impl WaitOutcome {
  pub const fn is_ready(self) -> bool {
    matches!(self, Self::Ready)
  }
}

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  /// Poll DOUT/RDY until it goes low or the configured budget is spent.
  ///
  /// The line only reflects conversion state while chip select is asserted,
  /// so this is normally called through [`crate::Selected`].
  pub(crate) fn poll_ready(&mut self) -> Result<WaitOutcome, Error<E>> {
    let (mut budget, step_us) = match self.config.ready_timeout {
      ReadyTimeout::Polls(n) => (n, 0),
      ReadyTimeout::Micros(n) => (n, 1),
    };

    while self.rdy.is_high().map_err(|_| Error::Pin)? {
      if budget == 0 {
        return Ok(WaitOutcome::Expired);
      }
      budget -= 1;
      if step_us > 0 {
        self.delay.delay_us(step_us);
      }
    }
    Ok(WaitOutcome::Ready)
  }

  /// Wait for ready and apply the configured [`TimeoutPolicy`].
  pub(crate) fn wait_ready(&mut self) -> Result<(), Error<E>> {
    match self.poll_ready()? {
      WaitOutcome::Ready => Ok(()),
      WaitOutcome::Expired => match self.config.timeout_policy {
        TimeoutPolicy::Ignore => {
          warn!("DOUT/RDY did not assert within {}", self.config.ready_timeout);
          Ok(())
        }
        TimeoutPolicy::Fail => Err(Error::NotReady),
      },
    }
  }
}
