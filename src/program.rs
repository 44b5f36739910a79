/*!
  Loading a binary program means framing it: cutting the raw byte stream into instructions using
  the length implied by each opcode. Framing never fails. An unrecognized opcode costs one byte
  and the framer tries again at the next offset. A known opcode whose instruction runs past the
  end of the stream ends framing.
*/

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use prettytable::Table;

use crate::bytecode::{decode_operation, instruction_size, try_decode_instruction, Instruction, Operation};
use crate::error::{DecodeError, Error};
use crate::table::TABLE_DISPLAY_FORMAT;

/// A framed instruction: where it starts and what it is.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Frame {
  pub offset: usize,
  pub operation: Operation
}

impl Frame {
  pub fn size(&self) -> usize {
    instruction_size(self.operation)
  }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
  bytes        : Vec<u8>,
  frames       : Vec<Frame>,
  skipped      : usize,         // Bytes dropped while resynchronizing
  truncated_at : Option<usize>, // Offset of an incomplete final instruction
}

impl Program {

  pub fn load(bytes: Vec<u8>) -> Program {
    let mut frames       = Vec::new();
    let mut skipped      = 0;
    let mut truncated_at = None;

    let mut offset = 0;
    while offset < bytes.len() {
      match decode_operation(bytes[offset]) {

        Ok(operation) => {
          let size = instruction_size(operation);
          if bytes.len() - offset < size {
            truncated_at = Some(offset);
            break;
          }
          frames.push(Frame{ offset, operation });
          offset += size;
        }

        Err(_e) => {
          skipped += 1;
          offset += 1;
        }

      }
    }

    Program{ bytes, frames, skipped, truncated_at }
  }

  pub fn read<P: AsRef<Path>>(path: P) -> Result<Program, Error> {
    Ok(Program::load(fs::read(path)?))
  }

  /// Number of framed instructions.
  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn frames(&self) -> &[Frame] {
    &self.frames
  }

  /// Number of bytes with an unknown opcode that framing stepped over.
  pub fn skipped(&self) -> usize {
    self.skipped
  }

  pub fn truncated_at(&self) -> Option<usize> {
    self.truncated_at
  }

  /// The encoded bytes of the instruction at `pc`.
  pub fn frame_bytes(&self, pc: usize) -> Option<&[u8]> {
    self.frames
        .get(pc)
        .map(|frame| &self.bytes[frame.offset..frame.offset + frame.size()])
  }

  pub fn decode(&self, pc: usize) -> Option<Result<Instruction, DecodeError>> {
    self.frame_bytes(pc).map(try_decode_instruction)
  }

  /// Decodes every framed instruction, in program order.
  pub fn instructions(&self) -> impl Iterator<Item = Result<Instruction, DecodeError>> + '_ {
    (0..self.len()).filter_map(move |pc| self.decode(pc))
  }

  /// A disassembly table, one row per framed instruction.
  pub fn listing(&self, highlight: usize) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"PC", ubr->"Offset", ubl->"Instruction"]);

    for (pc, frame) in self.frames.iter().enumerate() {
      let text =
        match self.decode(pc) {
          Some(Ok(instruction)) => instruction.to_string(),
          Some(Err(e))          => e.to_string(),
          None                  => String::new()
        };
      let marker = if pc == highlight { "* --> " } else { "" };
      table.add_row(row![r->format!("{}{}", marker, pc), r->frame.offset, text]);
    }
    table
  }
}

impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} instructions in {} bytes, {} skipped",
      self.len(),
      self.bytes.len(),
      self.skipped
    )?;
    if let Some(offset) = self.truncated_at {
      write!(f, ", truncated at byte {}", offset)?;
    }
    Ok(())
  }
}
