/*!
  UVM is a tiny register-free virtual machine over a flat integer memory. This crate holds the
  pieces needed to take a program from assembly text to a memory dump:

  ```text
  text -> [`bytecode::parse_assembly`] -> IR -> [`bytecode::lower`] -> bytes ->⋯

  ⋯-> [`Program::load`] -> frames -> [`Machine::run`] -> `Memory` -> [`MemoryDump`]
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod config;
pub mod error;
pub mod memory;
pub mod program;
pub mod uvm;
mod table;

use std::fs;
use std::path::Path;

pub use config::{DumpRange, MachineConfig};
pub use error::{AssemblyError, DecodeError, Error};
pub use memory::{Memory, MemoryDump, Value};
pub use program::{Frame, Program};
pub use uvm::Machine;

use crate::bytecode::ParsedInstruction;

/// Reads assembly from `source`, writes the raw instruction stream to `binary`, and returns the
/// IR so callers can print a listing.
pub fn assemble_file<P, Q>(source: P, binary: Q) -> Result<Vec<ParsedInstruction>, Error>
  where P: AsRef<Path>,
        Q: AsRef<Path>
{
  let text = fs::read_to_string(source)?;
  let ir = bytecode::parse_assembly(&text)?;
  let bytes = bytecode::lower(&ir)?;
  fs::write(binary, bytes)?;

  #[cfg(feature = "trace_computation")]
  println!("{}", bytecode::listing(&ir));

  Ok(ir)
}

/// Loads the program in `binary`, runs it on a fresh machine, and writes the nonzero cells in
/// `range` to `dump` as JSON. The finished machine is returned for inspection.
pub fn run_file<P, Q>(binary: P, dump: Q, range: DumpRange, config: &MachineConfig)
  -> Result<Machine, Error>
  where P: AsRef<Path>,
        Q: AsRef<Path>
{
  let program = Program::read(binary)?;
  let mut machine = Machine::with_program(program, config);
  machine.run();
  machine.dump(range).save(dump)?;
  Ok(machine)
}
