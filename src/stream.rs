//! Packing of continuous-mode samples for a byte-oriented host link.
//!
//! Each quantity goes out as four bytes, `v >> 18`, `v >> 12`, `v >> 6` and
//! `v`, each masked to 7 bits so the high bit of every byte on the link stays
//! clear. The shifts step by 6, so each byte also repeats the lowest bit of
//! the group above it. Hosts decode with the same shifts.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::{Ad7190, Error, Register};

/// Packed size of one sample.
pub const SAMPLE_BYTES: usize = 4;
/// Packed size of one timestamp and sample pair.
pub const TIMESTAMPED_SAMPLE_BYTES: usize = 2 * SAMPLE_BYTES;

/// Pack a conversion result (or the low bits of anything wider).
pub const fn pack_word(v: u64) -> [u8; SAMPLE_BYTES] {
  [((v >> 18) & 0x7F) as u8, ((v >> 12) & 0x7F) as u8, ((v >> 6) & 0x7F) as u8, (v & 0x7F) as u8]
}

/// A free-running monotonic tick counter.
pub trait TickSource {
  fn ticks(&mut self) -> u64;
}

impl<F: FnMut() -> u64> TickSource for F {
  fn ticks(&mut self) -> u64 {
    self()
  }
}

/// Reference point for relative sample timestamps.
///
/// A fresh session counts from tick zero; [`TimestampSession::restart`]
/// moves the reference to the current tick. The reference is only changed by
/// the caller, so a session can span any number of reads.
pub struct TimestampSession<C> {
  clock: C,
  start: u64,
}

impl<C: TickSource> TimestampSession<C> {
  pub fn new(clock: C) -> Self {
    Self { clock, start: 0 }
  }

  /// Session whose reference is the current tick.
  pub fn started(clock: C) -> Self {
    let mut session = Self::new(clock);
    session.restart();
    session
  }

  pub fn restart(&mut self) {
    self.start = self.clock.ticks();
    debug!("timestamp session restarted at {}", self.start);
  }

  pub fn start(&self) -> u64 {
    self.start
  }

  /// Ticks since the reference, saturating at zero if the clock reads earlier.
  pub fn elapsed(&mut self) -> u64 {
    self.clock.ticks().saturating_sub(self.start)
  }

  pub fn into_clock(self) -> C {
    self.clock
  }
}

impl<SPI, CS, RDY, D, E> Ad7190<SPI, CS, RDY, D>
where
  SPI: SpiBus<u8, Error = E>,
  CS: OutputPin,
  RDY: InputPin,
  D: DelayNs,
{
  /// Pull `count` samples from an armed continuous conversion into `out`,
  /// [`SAMPLE_BYTES`] per sample. Returns the number of bytes written.
  pub fn read_continuous(&mut self, count: usize, out: &mut [u8]) -> Result<usize, Error<E>> {
    let len = check_len(count, SAMPLE_BYTES, out.len())?;

    let mut selected = self.select()?;
    for chunk in out[..len].chunks_exact_mut(SAMPLE_BYTES) {
      let sample = selected.read_sample()?;
      chunk.copy_from_slice(&pack_word(sample as u64));
    }
    selected.release()?;
    Ok(len)
  }

  /// Like [`Ad7190::read_continuous`], but each sample is preceded by the
  /// ticks elapsed in `session` when the part signalled it ready.
  /// [`TIMESTAMPED_SAMPLE_BYTES`] per sample.
  pub fn read_continuous_timestamped<C: TickSource>(
    &mut self,
    session: &mut TimestampSession<C>,
    count: usize,
    out: &mut [u8],
  ) -> Result<usize, Error<E>> {
    let len = check_len(count, TIMESTAMPED_SAMPLE_BYTES, out.len())?;

    let mut selected = self.select()?;
    for chunk in out[..len].chunks_exact_mut(TIMESTAMPED_SAMPLE_BYTES) {
      selected.wait_ready()?;
      let elapsed = session.elapsed();
      let sample = selected.read_register(Register::Data)?;

      let (ts, data) = chunk.split_at_mut(SAMPLE_BYTES);
      ts.copy_from_slice(&pack_word(elapsed));
      data.copy_from_slice(&pack_word(sample as u64));
    }
    selected.release()?;
    Ok(len)
  }
}

fn check_len<E>(count: usize, per_sample: usize, provided: usize) -> Result<usize, Error<E>> {
  let required = count.checked_mul(per_sample).ok_or(Error::BufferTooSmall { required: usize::MAX, provided })?;
  if provided < required {
    return Err(Error::BufferTooSmall { required, provided });
  }
  Ok(required)
}
