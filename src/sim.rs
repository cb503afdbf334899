//! Simulated AD7190 for unit tests.
//!
//! The bus, chip select and DOUT/RDY handles share one register file so a
//! test can preload registers and conversion results, run driver code, and
//! inspect what the part saw.

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::reg::{Command, PART_ID};
use crate::{Access, Ad7190, Config, Register};

const POWER_ON: [u32; 8] = [0x80, 0x08_0060, 0x00_0117, 0x00_0000, PART_ID as u32, 0x00, 0x80_0000, 0x55_4A70];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SimError;

impl spi::Error for SimError {
  fn kind(&self) -> spi::ErrorKind {
    spi::ErrorKind::Other
  }
}

struct State {
  regs: [u32; 8],
  samples: VecDeque<u32>,
  /// `None` keeps DOUT/RDY high forever.
  busy_each: Option<u32>,
  busy_left: u32,
  selected: bool,
  resets: usize,
  frames: Vec<Vec<u8>>,
  frames_outside: usize,
  window_frames: usize,
  last_window_frames: usize,
  polls: usize,
  polls_deselected: usize,
  delayed_ns: u64,
  fail_next: bool,
}

impl State {
  fn record(&mut self, frame: &[u8]) {
    self.frames.push(frame.to_vec());
    if self.selected {
      self.window_frames += 1;
    } else {
      self.frames_outside += 1;
    }
  }

  fn take_failure(&mut self) -> Result<(), SimError> {
    if core::mem::take(&mut self.fail_next) {
      return Err(SimError);
    }
    Ok(())
  }

  fn reset(&mut self) {
    let id = self.regs[Register::Id.address() as usize];
    self.regs = POWER_ON;
    self.regs[Register::Id.address() as usize] = id;
    self.resets += 1;
  }
}

pub(crate) struct Sim {
  state: Rc<RefCell<State>>,
}

pub(crate) struct SimSpi(Rc<RefCell<State>>);
pub(crate) struct SimCs(Rc<RefCell<State>>);
pub(crate) struct SimRdy(Rc<RefCell<State>>);
pub(crate) struct SimDelay(Rc<RefCell<State>>);

impl Sim {
  pub(crate) fn new() -> Self {
    let state = State {
      regs: POWER_ON,
      samples: VecDeque::new(),
      busy_each: Some(0),
      busy_left: 0,
      selected: false,
      resets: 0,
      frames: Vec::new(),
      frames_outside: 0,
      window_frames: 0,
      last_window_frames: 0,
      polls: 0,
      polls_deselected: 0,
      delayed_ns: 0,
      fail_next: false,
    };
    Self { state: Rc::new(RefCell::new(state)) }
  }

  pub(crate) fn driver(&self, config: Config) -> Ad7190<SimSpi, SimCs, SimRdy, SimDelay> {
    Ad7190::new(
      SimSpi(self.state.clone()),
      SimCs(self.state.clone()),
      SimRdy(self.state.clone()),
      SimDelay(self.state.clone()),
      config,
    )
  }

  pub(crate) fn set_register(&self, reg: Register, value: u32) {
    self.state.borrow_mut().regs[reg.address() as usize] = value;
  }

  pub(crate) fn register(&self, reg: Register) -> u32 {
    self.state.borrow().regs[reg.address() as usize]
  }

  /// Results handed out by successive data register reads.
  pub(crate) fn queue_samples(&self, samples: &[u32]) {
    self.state.borrow_mut().samples.extend(samples.iter().copied());
  }

  /// Keep DOUT/RDY high for `polls` reads before each result.
  pub(crate) fn busy_for(&self, polls: u32) {
    let mut s = self.state.borrow_mut();
    s.busy_each = Some(polls);
    s.busy_left = polls;
  }

  pub(crate) fn never_ready(&self) {
    self.state.borrow_mut().busy_each = None;
  }

  /// Make the next bus write or exchange fail without reaching the part.
  pub(crate) fn fail_next_transfer(&self) {
    self.state.borrow_mut().fail_next = true;
  }

  pub(crate) fn selected(&self) -> bool {
    self.state.borrow().selected
  }

  pub(crate) fn resets(&self) -> usize {
    self.state.borrow().resets
  }

  pub(crate) fn ready_polls(&self) -> usize {
    self.state.borrow().polls
  }

  pub(crate) fn polls_while_deselected(&self) -> usize {
    self.state.borrow().polls_deselected
  }

  pub(crate) fn delayed_us(&self) -> u64 {
    self.state.borrow().delayed_ns / 1_000
  }

  pub(crate) fn delayed_ms(&self) -> u64 {
    self.state.borrow().delayed_ns / 1_000_000
  }

  /// Frames clocked during the most recent completed chip-select window.
  pub(crate) fn last_window_frames(&self) -> usize {
    self.state.borrow().last_window_frames
  }

  pub(crate) fn frames_outside_select(&self) -> usize {
    self.state.borrow().frames_outside
  }

  pub(crate) fn frame_count(&self) -> usize {
    self.state.borrow().frames.len()
  }

  /// Bytes the driver shifted out in the last transaction.
  pub(crate) fn last_frame(&self) -> Vec<u8> {
    self.state.borrow().frames.last().cloned().unwrap_or_default()
  }
}

impl spi::ErrorType for SimSpi {
  type Error = SimError;
}

impl SpiBus<u8> for SimSpi {
  fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
    words.fill(0);
    Ok(())
  }

  fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
    let mut s = self.0.borrow_mut();
    s.take_failure()?;
    s.record(words);

    if words.len() >= 5 && words.iter().all(|&b| b == 0xFF) {
      s.reset();
      return Ok(());
    }

    let Some((&cmd, payload)) = words.split_first() else {
      return Ok(());
    };
    let cmd = Command::from_bits(cmd);
    let writable = Register::from_address(cmd.address()).is_some_and(|r| r.access() == Access::ReadWrite);
    if !cmd.read() && writable {
      s.regs[cmd.address() as usize] = payload.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    }
    Ok(())
  }

  fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
    let mut buf = write.to_vec();
    buf.resize(read.len().max(write.len()), 0);
    self.transfer_in_place(&mut buf)?;
    let n = read.len();
    read.copy_from_slice(&buf[..n]);
    Ok(())
  }

  fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
    let mut s = self.0.borrow_mut();
    s.take_failure()?;
    s.record(words);

    let cmd = Command::from_bits(words[0]);
    if !cmd.read() {
      return Ok(());
    }
    let addr = cmd.address() as usize;
    let value = if addr == Register::Data.address() as usize {
      let next = s.samples.pop_front().unwrap_or(s.regs[addr]);
      s.regs[addr] = next;
      s.busy_left = s.busy_each.unwrap_or(0);
      next
    } else {
      s.regs[addr]
    };

    let payload = &mut words[1..];
    let n = payload.len();
    for (i, b) in payload.iter_mut().enumerate() {
      let shift = 8 * (n - 1 - i);
      *b = if shift < 32 { (value >> shift) as u8 } else { 0 };
    }
    Ok(())
  }

  fn flush(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}

impl digital::ErrorType for SimCs {
  type Error = Infallible;
}

impl OutputPin for SimCs {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    let mut s = self.0.borrow_mut();
    s.selected = true;
    s.window_frames = 0;
    Ok(())
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    let mut s = self.0.borrow_mut();
    if s.selected {
      s.last_window_frames = s.window_frames;
    }
    s.selected = false;
    Ok(())
  }
}

impl digital::ErrorType for SimRdy {
  type Error = Infallible;
}

impl InputPin for SimRdy {
  fn is_high(&mut self) -> Result<bool, Self::Error> {
    let mut s = self.0.borrow_mut();
    s.polls += 1;
    if !s.selected {
      s.polls_deselected += 1;
    }
    match s.busy_each {
      None => Ok(true),
      Some(_) if s.busy_left > 0 => {
        s.busy_left -= 1;
        Ok(true)
      }
      Some(_) => Ok(false),
    }
  }

  fn is_low(&mut self) -> Result<bool, Self::Error> {
    self.is_high().map(|high| !high)
  }
}

impl DelayNs for SimDelay {
  fn delay_ns(&mut self, ns: u32) {
    self.0.borrow_mut().delayed_ns += ns as u64;
  }
}
