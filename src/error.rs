//! Error types. Assembly errors are fatal and carry the source line they came from. Decode
//! errors are only fatal to the caller that asked for a single instruction; the framer and the
//! interpreter degrade around them instead.

use std::io;

use thiserror::Error;

use crate::bytecode::{Operation, Word};

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AssemblyError {
  #[error("Error on line {line}: {token} is not a non-negative integer.")]
  MalformedOperand {
    line: usize,
    token: String
  },
  #[error("Error on line {line}: {name} is not an operation.")]
  UnknownMnemonic {
    line: usize,
    name: String
  },
  #[error(
    "Error on line {line}: {operation} requires {} arguments but was given {}: ({})",
    .operation.arity(),
    .operands.len(),
    join_operands(.operands)
  )]
  ArityMismatch {
    line: usize,
    operation: Operation,
    operands: Vec<Word>
  },
}

fn join_operands(operands: &[Word]) -> String {
  operands
    .iter()
    .map(Word::to_string)
    .collect::<Vec<String>>()
    .join(", ")
}

impl AssemblyError {
  pub fn line(&self) -> usize {
    match self {
      | AssemblyError::MalformedOperand{line, ..}
      | AssemblyError::UnknownMnemonic{line, ..}
      | AssemblyError::ArityMismatch{line, ..} => *line
    }
  }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
  #[error("instruction needs {needed} bytes but only {available} remain")]
  TruncatedInstruction {
    needed: usize,
    available: usize
  },
  #[error("{0} is not an opcode")]
  UnknownOpcode(u8),
}

/// Everything that can go wrong while moving programs and dumps through the file system.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Assembly(#[from] AssemblyError),
  #[error("io error: {0}")]
  Io(#[from] io::Error),
  #[error("could not write memory dump: {0}")]
  Json(#[from] serde_json::Error),
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_line() {
    let error = AssemblyError::ArityMismatch{
      line: 4,
      operation: Operation::Max,
      operands: vec![1, 2]
    };
    assert_eq!(error.line(), 4);
    assert_eq!(
      error.to_string(),
      "Error on line 4: max requires 3 arguments but was given 2: (1, 2)"
    );

    let error = AssemblyError::MalformedOperand{ line: 9, token: "0x10".to_string() };
    assert_eq!(error.to_string(), "Error on line 9: 0x10 is not a non-negative integer.");
  }
}
