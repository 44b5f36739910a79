//! The UVM interpreter: a fetch-decode-execute loop over a framed `Program` that mutates a
//! `Memory` it owns outright.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use crate::bytecode::Instruction;
use crate::config::{DumpRange, MachineConfig};
use crate::memory::{Memory, MemoryDump, Value};
use crate::program::Program;
use crate::table::{make_address_table, TABLE_DISPLAY_FORMAT};

pub struct Machine {

  // Flags
  running: bool,

  // Memory Stores
  memory: Memory,   // Data memory
  program: Program, // Code memory, framed

  // Registers //
  pc: usize, // Index into `program`'s frames, not a byte offset

}

impl Machine {

  pub fn new(config: &MachineConfig) -> Machine {
    Machine::with_program(Program::default(), config)
  }

  pub fn with_program(program: Program, config: &MachineConfig) -> Machine {
    Machine {
      running : true,
      memory  : Memory::new(config.memory_size),
      program,
      pc      : 0,
    }
  }

  /// Replaces the program and rewinds. Memory is kept.
  pub fn load(&mut self, program: Program) {
    self.program = program;
    self.reset();
  }

  pub fn load_bytes(&mut self, bytes: Vec<u8>) {
    self.load(Program::load(bytes));
  }

  /// Rewinds to the first instruction.
  pub fn reset(&mut self) {
    self.pc      = 0;
    self.running = true;
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  pub fn pc(&self) -> usize {
    self.pc
  }

  pub fn is_running(&self) -> bool {
    self.running
  }

  /**
    Executes the instruction at `pc` and advances `pc` by one. A frame that fails to decode is
    skipped but still advances `pc`. Returns `false`, without doing anything, once the program is
    exhausted.
  */
  pub fn step(&mut self) -> bool {
    if !self.running || self.pc >= self.program.len() {
      self.running = false;
      return false;
    }

    #[cfg(feature = "trace_computation")]
    println!("{}", self);

    if let Some(Ok(instruction)) = self.program.decode(self.pc) {
      self.execute(&instruction);
    }
    self.pc += 1;
    true
  }

  /// Runs the program from the start until it is exhausted.
  pub fn run(&mut self) {
    self.reset();
    while self.step() {}

    #[cfg(feature = "trace_computation")]
    println!("{}", self);
  }

  /**
    Applies a single instruction to memory. Every address the instruction touches is checked
    before any cell is read or written; if one is out of bounds the instruction has no effect
    and `false` is returned.
  */
  pub fn execute(&mut self, instruction: &Instruction) -> bool {
    let memory = &mut self.memory;
    let applied =
      match *instruction {

        Instruction::LoadConstant{address, constant} => {
          match Value::try_from(constant) {
            Ok(constant) => memory.set(address, constant),
            Err(_e)      => false
          }
        }

        Instruction::LoadMemory{target, pointer} => {
          let resolved =
            match (memory.resolve(target), memory.resolve(pointer)) {
              (Some(target), Some(pointer)) => {
                memory.resolve_value(memory[pointer]).map(|source| (target, source))
              }
              _ => None
            };
          match resolved {
            Some((target, source)) => {
              memory[target] = memory[source];
              true
            }
            None => false
          }
        }

        Instruction::StoreMemory{source, target} => {
          match (memory.resolve(source), memory.resolve(target)) {
            (Some(source), Some(target)) => {
              memory[target] = memory[source];
              true
            }
            _ => false
          }
        }

        Instruction::Max{lhs, target, rhs} => {
          match (memory.resolve(lhs), memory.resolve(target), memory.resolve(rhs)) {
            (Some(lhs), Some(target), Some(rhs)) => {
              memory[target] = memory[lhs].max(memory[rhs]);
              true
            }
            _ => false
          }
        }

      };

    #[cfg(feature = "trace_computation")]
    {
      if !applied {
        println!("Skipped out of bounds instruction: {}", instruction);
      }
    }

    applied
  }

  pub fn dump(&self, range: DumpRange) -> MemoryDump {
    self.memory.dump(range)
  }
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let cells: Vec<(usize, Value)> = self.memory.nonzero().collect();
    let m_table = make_address_table('M', &cells);
    let c_table = self.program.listing(self.pc);

    let mut combined_table = table!([c_table, m_table]);

    combined_table.set_titles(row![ub->"Program", ub->"Memory"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let status = match self.running {
      true  => "Running.",
      false => "Halted."
    };

    write!(f, "PC: {}\t{}\n{}", self.pc, status, combined_table)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::assemble;

  fn run_source(text: &str, memory_size: usize) -> Machine {
    let mut machine = Machine::new(&MachineConfig::new(memory_size));
    machine.load_bytes(assemble(text).unwrap());
    machine.run();
    machine
  }

  #[test]
  fn load_constants() {
    let machine = run_source("ldc 13 492\nldc 0 964\n", 100);
    assert_eq!(machine.memory()[13], 492);
    assert_eq!(machine.memory()[0], 964);
    assert_eq!(machine.pc(), 2);
    assert!(!machine.is_running());
  }

  #[test]
  fn max_of_two_cells() {
    let machine = run_source("ldc 1000 45\nldc 1001 200\nmax 1000 2000 1001\n", 4096);
    assert_eq!(machine.memory()[2000], 200);
    assert_eq!(machine.memory()[1000], 45);
  }

  #[test]
  fn max_uses_b_and_d_writes_c() {
    let machine = run_source("ldc 10 7\nldc 12 3\nmax 10 11 12\n", 64);
    assert_eq!(machine.memory()[11], 7);
    assert_eq!(machine.memory()[10], 7);
    assert_eq!(machine.memory()[12], 3);
  }

  #[test]
  fn load_through_pointer() {
    // memory[2] holds the address 5, which holds 42.
    let machine = run_source("ldc 5 42\nldc 2 5\nldm 9 2\n", 16);
    assert_eq!(machine.memory()[9], 42);
  }

  #[test]
  fn store_copies_b_into_c() {
    let machine = run_source("ldc 3 77\nstm 3 8\n", 16);
    assert_eq!(machine.memory()[8], 77);
    assert_eq!(machine.memory()[3], 77);
  }

  #[test]
  fn out_of_bounds_cancels_whole_instruction() {
    let size = 64;
    let mut machine = Machine::new(&MachineConfig::new(size));
    machine.load_bytes(assemble("ldc 1 5\nldc 2 9\n").unwrap());
    machine.run();
    let before = machine.memory().clone();

    let s = size as u64;
    let instructions = [
      Instruction::Max{ lhs: 1, target: 3, rhs: s },
      Instruction::Max{ lhs: s, target: 3, rhs: 2 },
      Instruction::Max{ lhs: 1, target: s, rhs: 2 },
      Instruction::StoreMemory{ source: 1, target: s },
      Instruction::StoreMemory{ source: s, target: 1 },
      Instruction::LoadMemory{ target: s, pointer: 1 },
      Instruction::LoadMemory{ target: 3, pointer: s },
      Instruction::LoadConstant{ address: s, constant: 1 },
    ];
    for instruction in instructions.iter() {
      assert!(!machine.execute(instruction), "{} should be skipped", instruction);
    }
    assert_eq!(machine.memory(), &before);
  }

  #[test]
  fn oversized_constant_is_skipped() {
    let mut machine = Machine::new(&MachineConfig::new(16));
    assert!(!machine.execute(&Instruction::LoadConstant{ address: 0, constant: u64::MAX }));
    assert_eq!(machine.memory()[0], 0);
    assert!(machine.execute(&Instruction::LoadConstant{ address: 0, constant: Value::MAX as u64 }));
    assert_eq!(machine.memory()[0], Value::MAX);
  }

  #[test]
  fn pointer_out_of_bounds() {
    // memory[1] points past the end of a 16 cell memory.
    let mut machine = Machine::new(&MachineConfig::new(16));
    machine.memory_mut()[1] = 16;
    assert!(!machine.execute(&Instruction::LoadMemory{ target: 0, pointer: 1 }));
    machine.memory_mut()[1] = -3;
    assert!(!machine.execute(&Instruction::LoadMemory{ target: 0, pointer: 1 }));
    assert_eq!(machine.memory()[0], 0);
  }

  #[test]
  fn execution_continues_after_skipped_instruction() {
    let machine = run_source("ldc 100 1\nldc 3 4\n", 50);
    assert_eq!(machine.memory()[3], 4);
    assert_eq!(machine.pc(), 2);
  }

  #[test]
  fn same_program_same_result() {
    let bytes = assemble(
      "ldc 1000 45\nldc 1001 200\nldc 7 1000\nldm 8 7\nstm 8 9\nmax 1000 2000 1001\n"
    ).unwrap();
    let program = Program::load(bytes);
    let config  = MachineConfig::new(4096);

    let mut first = Machine::with_program(program.clone(), &config);
    first.run();
    let mut second = Machine::with_program(program, &config);
    second.run();

    assert_eq!(first.memory(), second.memory());
    assert_eq!(first.memory()[9], 45);
    assert_eq!(first.memory()[2000], 200);
  }

  #[test]
  fn step_by_step() {
    let mut machine = Machine::new(&MachineConfig::new(16));
    machine.load_bytes(assemble("ldc 1 1\nldc 2 2\n").unwrap());
    assert!(machine.step());
    assert_eq!(machine.memory()[1], 1);
    assert_eq!(machine.memory()[2], 0);
    assert!(machine.step());
    assert!(!machine.step());
    assert!(!machine.is_running());
  }

  #[test]
  fn empty_program() {
    let mut machine = Machine::new(&MachineConfig::default());
    machine.run();
    assert_eq!(machine.pc(), 0);
    assert!(machine.dump(DumpRange::default()).is_empty());
  }

  #[test]
  fn state_table() {
    let machine = run_source("ldc 4 9\n", 16);
    let text = machine.to_string();
    assert!(text.starts_with("PC: 1\tHalted."));
    assert!(text.contains("M[4] ="));
    assert!(!text.contains("* --> M["));
  }
}
