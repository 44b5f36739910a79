/*!
  This module is responsible for the encoding and decoding of binary instructions.

  An instruction is treated as a single little-endian integer of its declared length. The
  largest instruction is 9 bytes, so everything is composed in a 128 bit word and only the low
  `instruction_size` bytes are ever emitted.
*/
use std::convert::TryFrom;

use super::{Instruction, Operation, Word};
use crate::error::DecodeError;

// If you change this you must also change `MAX_INSTRUCTION_SIZE`.
pub type EncodedWord = u128;

pub const MAX_INSTRUCTION_SIZE: usize = 9;
pub const OPCODE_MASK: u8 = 0x1F;

/// A bit range within an encoded instruction word. Bit 0 is the least significant bit of the
/// first byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Field {
  pub offset: u32,
  pub width: u32
}

impl Field {
  pub const fn new(offset: u32, width: u32) -> Field {
    Field{ offset, width }
  }

  pub fn mask(&self) -> EncodedWord {
    ((1 as EncodedWord) << self.width) - 1
  }

  pub fn extract(&self, word: EncodedWord) -> Word {
    ((word >> self.offset) & self.mask()) as Word
  }

  /// Writes `value` into the field. Bits of `value` above the field's width are discarded.
  pub fn insert(&self, word: EncodedWord, value: Word) -> EncodedWord {
    (word & !(self.mask() << self.offset)) | ((value as EncodedWord & self.mask()) << self.offset)
  }
}

pub const OPCODE_FIELD: Field = Field::new(0, 5);

const B_FIELD       : Field = Field::new( 5, 22);
const C_FIELD       : Field = Field::new(27, 22);
const CONSTANT_FIELD: Field = Field::new(27, 16);
const D_FIELD       : Field = Field::new(49, 22);

static LDC_FIELDS   : [Field; 2] = [B_FIELD, CONSTANT_FIELD];
static ADDRESS_PAIR : [Field; 2] = [B_FIELD, C_FIELD];
static MAX_FIELDS   : [Field; 3] = [B_FIELD, C_FIELD, D_FIELD];

/// The operand fields of `operation` in positional (B, C, D) order.
pub fn operand_fields(operation: Operation) -> &'static [Field] {
  match operation {
    Operation::Ldc => &LDC_FIELDS,
    Operation::Ldm => &ADDRESS_PAIR,
    Operation::Stm => &ADDRESS_PAIR,
    Operation::Max => &MAX_FIELDS,
  }
}

/// Returns the size in BYTES of an instruction for the corresponding opcode.
pub fn instruction_size(operation: Operation) -> usize {
  match operation {
    Operation::Ldc => 6,
    Operation::Ldm => 7,
    Operation::Stm => 7,
    Operation::Max => 9,
  }
}

/// Reads the opcode from the low 5 bits of the first byte of an instruction.
pub fn decode_operation(byte: u8) -> Result<Operation, DecodeError> {
  let tag = byte & OPCODE_MASK;
  Operation::try_from(tag).map_err(|_| DecodeError::UnknownOpcode(tag))
}

/**
  Encodes the instruction into exactly `instruction_size` bytes. Operands wider than their
  field silently wrap modulo 2^width.
*/
pub fn encode_instruction(instruction: &Instruction) -> Vec<u8> {
  let operation = instruction.operation();
  let word =
    operand_fields(operation)
      .iter()
      .zip(instruction.operands())
      .fold(
        OPCODE_FIELD.insert(0, operation.code() as Word),
        |word, (field, value)| field.insert(word, value)
      );

  word.to_le_bytes()[..instruction_size(operation)].to_vec()
}

/**
  Decodes the instruction at the start of `bytes`. Bytes past the instruction's declared size
  are ignored, so this can be pointed at the middle of a program.
*/
pub fn try_decode_instruction(bytes: &[u8]) -> Result<Instruction, DecodeError> {
  let first = match bytes.first() {
    Some(byte) => *byte,
    None => {
      return Err(DecodeError::TruncatedInstruction{ needed: 1, available: 0 });
    }
  };
  let operation = decode_operation(first)?;
  let size      = instruction_size(operation);

  if bytes.len() < size {
    return Err(DecodeError::TruncatedInstruction{ needed: size, available: bytes.len() });
  }

  let word =
    bytes[..size]
      .iter()
      .rev()
      .fold(0 as EncodedWord, |word, byte| (word << 8) | *byte as EncodedWord);
  let fields = operand_fields(operation);
  let field  = |i: usize| fields[i].extract(word);

  let instruction =
    match operation {
      Operation::Ldc => Instruction::LoadConstant{ address: field(0), constant: field(1) },
      Operation::Ldm => Instruction::LoadMemory{ target: field(0), pointer: field(1) },
      Operation::Stm => Instruction::StoreMemory{ source: field(0), target: field(1) },
      Operation::Max => Instruction::Max{ lhs: field(0), target: field(1), rhs: field(2) },
    };

  Ok(instruction)
}
