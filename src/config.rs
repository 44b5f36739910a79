//! Machine and dump settings, with the defaults the command line falls back to.

use std::ops::Range;

pub const DEFAULT_MEMORY_SIZE: usize = 65536;
pub const DEFAULT_DUMP_START : usize = 0;
pub const DEFAULT_DUMP_END   : usize = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MachineConfig {
  /// Number of memory cells. Fixed for the life of the machine.
  pub memory_size: usize
}

impl MachineConfig {
  pub fn new(memory_size: usize) -> MachineConfig {
    MachineConfig{ memory_size }
  }
}

impl Default for MachineConfig {
  fn default() -> Self {
    MachineConfig::new(DEFAULT_MEMORY_SIZE)
  }
}

/// The half-open address range `[start, end)` written to a memory dump.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DumpRange {
  pub start: usize,
  pub end: usize
}

impl DumpRange {
  pub fn new(start: usize, end: usize) -> DumpRange {
    DumpRange{ start, end }
  }

  /// The range clipped to a memory of `size` cells.
  pub fn clamp(&self, size: usize) -> Range<usize> {
    let end = self.end.min(size);
    self.start.min(end)..end
  }
}

impl Default for DumpRange {
  fn default() -> Self {
    DumpRange::new(DEFAULT_DUMP_START, DEFAULT_DUMP_END)
  }
}
