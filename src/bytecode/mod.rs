/*!

  The UVM has no registers and no control flow. Every instruction names cells of a flat memory
  by their index, and execution simply walks the instruction stream front to back.

  Instructions are bit-packed and variable length. The low 5 bits of the first byte hold the
  opcode, which alone determines the total length of the instruction. The remaining fields are
  unsigned little-endian bit fields that freely straddle byte boundaries:

    LDC:  6 bytes   [OpCode:5][B:22][C:16]
    LDM:  7 bytes   [OpCode:5][B:22][C:22]
    STM:  7 bytes   [OpCode:5][B:22][C:22]
    MAX:  9 bytes   [OpCode:5][B:22][C:22][D:22]

  Unused high bits of the last byte are zero. There is no header, alignment, or padding between
  instructions, so a program file is just the concatenation of its encoded instructions.

  Unlike the opcode, the decoded `Instruction` stores its arguments inside the enum variant. With
  at most three fields this costs nothing worth worrying about, and it lets the interpreter match
  exhaustively on the instruction rather than on a tag plus a loose argument list.

*/

mod binary;
mod assembly;

pub use binary::{
  encode_instruction,
  try_decode_instruction,
  decode_operation,
  instruction_size,
  operand_fields,
  Field,
  EncodedWord,
  OPCODE_FIELD,
  OPCODE_MASK,
  MAX_INSTRUCTION_SIZE
};
pub use assembly::{assemble, listing, lower, parse_assembly, parse_line, ParsedInstruction};

use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

/// Operand values as they appear in source and in decoded instructions.
pub type Word = u64;

/**
  Opcodes of the virtual machine.

  The discriminant of each variant is its 5-bit tag in the binary encoding, and the strum
  serialization is its assembly mnemonic. The tags are not contiguous, so the size and layout of
  an instruction come from an explicit table in `binary` rather than from the variant order.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[repr(u8)]
pub enum Operation {
  #[strum(serialize = "ldc")]
  Ldc = 13,          // ldc( address, constant )
  #[strum(serialize = "ldm")]
  Ldm = 31,          // ldm( target, pointer )
  #[strum(serialize = "stm")]
  Stm = 7,           // stm( source, target )
  #[strum(serialize = "max")]
  Max = 28,          // max( lhs, target, rhs )
}

impl Operation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Number of operands the instruction takes in assembly.
  pub fn arity(&self) -> usize {
    match self {
      Operation::Max => 3,
      _              => 2
    }
  }

  /// Total encoded length in bytes, opcode included.
  pub fn size(&self) -> usize {
    instruction_size(*self)
  }
}

/**
  A decoded instruction. Field names follow the execution semantics; the comments give the
  positional operand each one occupies in assembly and in the binary layout.
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// `memory[B] = C`
  LoadConstant {
    address  : Word, // B
    constant : Word  // C
  },
  /// `memory[B] = memory[memory[C]]`
  LoadMemory {
    target  : Word, // B
    pointer : Word  // C
  },
  /// `memory[C] = memory[B]`
  StoreMemory {
    source : Word, // B
    target : Word  // C
  },
  /// `memory[C] = max(memory[B], memory[D])`
  Max {
    lhs    : Word, // B
    target : Word, // C
    rhs    : Word  // D
  },
}

impl Instruction {
  pub fn operation(&self) -> Operation {
    match self {
      Instruction::LoadConstant{..} => Operation::Ldc,
      Instruction::LoadMemory{..}   => Operation::Ldm,
      Instruction::StoreMemory{..}  => Operation::Stm,
      Instruction::Max{..}          => Operation::Max,
    }
  }

  /// The operands in positional (B, C, D) order.
  pub fn operands(&self) -> Vec<Word> {
    match *self {
      Instruction::LoadConstant{address, constant} => vec![address, constant],
      Instruction::LoadMemory{target, pointer}     => vec![target, pointer],
      Instruction::StoreMemory{source, target}     => vec![source, target],
      Instruction::Max{lhs, target, rhs}           => vec![lhs, target, rhs],
    }
  }

  /// Builds an instruction from positional operands. Returns `None` if the number of operands
  /// does not match the operation's arity.
  pub fn from_operands(operation: Operation, operands: &[Word]) -> Option<Instruction> {
    let instruction =
      match (operation, operands) {
        (Operation::Ldc, &[address, constant]) => Instruction::LoadConstant{address, constant},
        (Operation::Ldm, &[target, pointer])   => Instruction::LoadMemory{target, pointer},
        (Operation::Stm, &[source, target])    => Instruction::StoreMemory{source, target},
        (Operation::Max, &[lhs, target, rhs])  => Instruction::Max{lhs, target, rhs},
        _                                      => return None
      };
    Some(instruction)
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} {}",
      self.operation(),
      self.operands()
          .iter()
          .map(Word::to_string)
          .collect::<Vec<String>>()
          .join(" ")
    )
  }
}
