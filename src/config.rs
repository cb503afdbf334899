use crate::control::ClockSource;
use crate::ready::{ReadyTimeout, TimeoutPolicy};

/// Filter word used by single conversions and averaged reads unless overridden.
pub const DEFAULT_RATE: u16 = 0x060;

/// Driver-side settings. Nothing here is written to the part directly; the
/// values shape the mode words and handshakes the driver issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  pub ready_timeout: ReadyTimeout,
  pub timeout_policy: TimeoutPolicy,
  /// Pause after a reset before the registers are touched. The part needs 500 µs.
  pub reset_settle_ms: u32,
  /// Clock source for single conversions and averaged reads.
  pub clock: ClockSource,
  /// 10-bit filter word (FS9..FS0) for single conversions and averaged reads.
  pub rate: u16,
}

impl Config {
  pub const fn new() -> Self {
    Self {
      ready_timeout: ReadyTimeout::Polls(crate::ready::DEFAULT_READY_POLLS),
      timeout_policy: TimeoutPolicy::Ignore,
      reset_settle_ms: 1,
      clock: ClockSource::ExternalClock,
      rate: DEFAULT_RATE,
    }
  }

  pub const fn with_ready_timeout(mut self, timeout: ReadyTimeout) -> Self {
    self.ready_timeout = timeout;
    self
  }

  pub const fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
    self.timeout_policy = policy;
    self
  }

  pub const fn with_reset_settle_ms(mut self, ms: u32) -> Self {
    self.reset_settle_ms = ms;
    self
  }

  pub const fn with_clock(mut self, clock: ClockSource) -> Self {
    self.clock = clock;
    self
  }

  /// Only the low 10 bits are kept.
  pub const fn with_rate(mut self, rate: u16) -> Self {
    self.rate = rate & crate::control::RATE_MASK;
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new()
  }
}
