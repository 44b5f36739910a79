/*!
  The human readable textual form of bytecode is called assembly. One instruction per line:

  ```text
  ldc 1000 45       # memory[1000] = 45
  max 1000 2000 999 # memory[2000] = max(memory[1000], memory[999])
  ```

  Mnemonics are case-insensitive, operands are non-negative decimal integers, and everything
  after a `#` is a comment. Assembly happens in two passes. `parse_assembly` turns text into IR,
  checking only that each line is well formed, and `lower` checks arity and encodes the IR into
  the raw instruction stream.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::{
  bytes::complete::{take_till1, take_while, take_while1},
  character::complete::{char as one_char, digit1},
  combinator::{all_consuming, map_res, opt, rest},
  multi::separated_list,
  sequence::{delimited, preceded, terminated},
  IResult
};
use prettytable::Table;

use crate::bytecode::{encode_instruction, Instruction, Operation, Word};
use crate::error::AssemblyError;
use crate::table::TABLE_DISPLAY_FORMAT;

/// One line of assembly after parsing. The operand count has not been checked yet.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParsedInstruction {
  /// 1-based line number in the source text.
  pub line: usize,
  pub operation: Operation,
  pub operands: Vec<Word>
}

impl ParsedInstruction {
  pub fn to_instruction(&self) -> Result<Instruction, AssemblyError> {
    Instruction::from_operands(self.operation, &self.operands).ok_or_else(|| {
      AssemblyError::ArityMismatch {
        line: self.line,
        operation: self.operation,
        operands: self.operands.clone()
      }
    })
  }
}

impl Display for ParsedInstruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.operation)?;
    for operand in self.operands.iter() {
      write!(f, " {}", operand)?;
    }
    Ok(())
  }
}

/// Splits a line into whitespace separated tokens, discarding a trailing comment. Any Unicode
/// whitespace separates tokens.
fn line_tokens(line: &str) -> IResult<&str, Vec<&str>> {
  all_consuming(
    terminated(
      delimited(
        take_while(char::is_whitespace),
        separated_list(
          take_while1(char::is_whitespace),
          take_till1(|c: char| c.is_whitespace() || c == '#')
        ),
        take_while(char::is_whitespace)
      ),
      opt(preceded(one_char('#'), rest))
    )
  )(line)
}

fn operand(token: &str) -> IResult<&str, Word> {
  all_consuming(map_res(digit1, Word::from_str))(token)
}

/// Parses a single line. Blank lines and comments produce `Ok(None)`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ParsedInstruction>, AssemblyError> {
  let tokens =
    match line_tokens(text) {
      Ok((_rest, tokens)) => tokens,
      Err(_e) => {
        return Err(AssemblyError::MalformedOperand{ line, token: text.trim().to_string() });
      }
    };

  let (mnemonic, arguments) =
    match tokens.split_first() {
      Some(split) => split,
      None        => return Ok(None)
    };

  let operation =
    Operation::from_str(&mnemonic.to_lowercase()).map_err(|_e| {
      AssemblyError::UnknownMnemonic{ line, name: mnemonic.to_string() }
    })?;

  let operands =
    arguments
      .iter()
      .map(|token| {
        match operand(token) {
          Ok((_rest, value)) => Ok(value),
          Err(_e) => Err(AssemblyError::MalformedOperand{ line, token: token.to_string() })
        }
      })
      .collect::<Result<Vec<Word>, AssemblyError>>()?;

  Ok(Some(ParsedInstruction{ line, operation, operands }))
}

/// Parses assembly text into IR. Stops at the first malformed line.
pub fn parse_assembly(text: &str) -> Result<Vec<ParsedInstruction>, AssemblyError> {
  let mut ir = Vec::new();
  for (idx, line) in text.lines().enumerate() {
    if let Some(instruction) = parse_line(idx + 1, line)? {
      ir.push(instruction);
    }
  }
  Ok(ir)
}

/// Encodes IR into the raw instruction stream: no header, no padding.
pub fn lower(ir: &[ParsedInstruction]) -> Result<Vec<u8>, AssemblyError> {
  let mut bytes = Vec::new();
  for parsed in ir {
    let instruction = parsed.to_instruction()?;
    bytes.extend(encode_instruction(&instruction));
  }
  Ok(bytes)
}

/// Parses and lowers in one step.
pub fn assemble(text: &str) -> Result<Vec<u8>, AssemblyError> {
  lower(&parse_assembly(text)?)
}

/// A table of the IR with the encoding of each instruction, for eyeballing assembler output.
pub fn listing(ir: &[ParsedInstruction]) -> Table {
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Line", ubl->"Instruction", ubl->"Bytes"]);

  for parsed in ir {
    let bytes =
      match parsed.to_instruction() {
        Ok(instruction) => {
          encode_instruction(&instruction)
            .iter()
            .map(|byte| format!("0x{:02X}", byte))
            .collect::<Vec<String>>()
            .join(", ")
        }
        Err(_e) => "arity mismatch".to_string()
      };
    table.add_row(row![r->parsed.line, parsed, bytes]);
  }
  table
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_simple_line() {
    let parsed = parse_line(3, "  LDC 13 492  ").unwrap();
    assert_eq!(
      parsed,
      Some(ParsedInstruction{ line: 3, operation: Operation::Ldc, operands: vec![13, 492] })
    );
  }

  #[test]
  fn blank_and_comment_lines() {
    assert_eq!(parse_line(1, ""), Ok(None));
    assert_eq!(parse_line(1, "   \t "), Ok(None));
    assert_eq!(parse_line(1, "# ldc 1 2"), Ok(None));
    assert_eq!(parse_line(1, "    #### comment"), Ok(None));
  }

  #[test]
  fn trailing_comment() {
    let parsed = parse_line(1, "max 2000 1000 999  # max(45, 151) = 151").unwrap().unwrap();
    assert_eq!(parsed.operation, Operation::Max);
    assert_eq!(parsed.operands, vec![2000, 1000, 999]);

    let parsed = parse_line(1, "stm 1 2#no space").unwrap().unwrap();
    assert_eq!(parsed.operands, vec![1, 2]);
  }

  #[test]
  fn unicode_whitespace() {
    let parsed = parse_line(1, "ldc 1 2\x0c").unwrap().unwrap();
    assert_eq!(parsed.operands, vec![1, 2]);

    let parsed = parse_line(1, "ldc\x0b1 2").unwrap().unwrap();
    assert_eq!(parsed.operation, Operation::Ldc);
    assert_eq!(parsed.operands, vec![1, 2]);

    let parsed = parse_line(1, "\u{a0}stm\u{2003}3 4 # comment").unwrap().unwrap();
    assert_eq!(parsed.operands, vec![3, 4]);
  }

  #[test]
  fn malformed_operand() {
    assert_eq!(
      parse_line(7, "ldc 1 x2"),
      Err(AssemblyError::MalformedOperand{ line: 7, token: "x2".to_string() })
    );
    assert_eq!(
      parse_line(2, "ldc -1 5"),
      Err(AssemblyError::MalformedOperand{ line: 2, token: "-1".to_string() })
    );
  }

  #[test]
  fn unknown_mnemonic() {
    assert_eq!(
      parse_line(5, "Jmp 4"),
      Err(AssemblyError::UnknownMnemonic{ line: 5, name: "Jmp".to_string() })
    );
  }

  #[test]
  fn line_numbers_count_blank_lines() {
    let text = "ldc 1 2\n\n# comment\nldm 3 4\n";
    let ir = parse_assembly(text).unwrap();
    assert_eq!(ir.len(), 2);
    assert_eq!(ir[1].line, 4);
    assert_eq!(ir[1].to_string(), "ldm 3 4");

    let error = parse_assembly("ldc 1 2\r\n\r\nldc 1 two\r\n").unwrap_err();
    assert_eq!(error.line(), 3);
  }

  #[test]
  fn arity_checked_when_lowering() {
    // Parsing alone accepts the wrong operand count.
    let ir = parse_assembly("ldc 1 2\nmax 1 2\n").unwrap();
    assert_eq!(
      lower(&ir),
      Err(AssemblyError::ArityMismatch{ line: 2, operation: Operation::Max, operands: vec![1, 2] })
    );
  }

  #[test]
  fn lower_concatenates() {
    let bytes = assemble("ldc 492 964\nstm 57 8\n").unwrap();
    assert_eq!(
      bytes,
      vec![
        0x8D, 0x3D, 0x00, 0x20, 0x1E, 0x00,
        0x27, 0x07, 0x00, 0x40, 0x00, 0x00, 0x00
      ]
    );
    assert_eq!(assemble("# nothing here\n"), Ok(vec![]));
  }

  #[test]
  fn listing_shows_encoding() {
    let ir = parse_assembly("ldc 492 964").unwrap();
    let text = listing(&ir).to_string();
    assert!(text.contains("ldc 492 964"));
    assert!(text.contains("0x8D, 0x3D, 0x00, 0x20, 0x1E, 0x00"));
  }
}
