use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

use uvm::bytecode::listing;
use uvm::{assemble_file, run_file, DumpRange, MachineConfig};

const USAGE: &str = "\
usage: uvm assemble <source.asm> <program.bin> [--test]
       uvm run <program.bin> <dump.json> [<start> <end>]";

#[derive(Debug, Error)]
enum UsageError {
  #[error("no command was provided")]
  NoCommand,
  #[error("{0} is not a command")]
  UnknownCommand(String),
  #[error("wrong number of arguments for {0}")]
  WrongArgumentCount(&'static str),
  #[error("{0} is not a valid address")]
  BadAddress(String),
}

enum Command {
  Assemble {
    source: PathBuf,
    binary: PathBuf,
    test: bool
  },
  Run {
    binary: PathBuf,
    dump: PathBuf,
    range: DumpRange
  },
}

fn parse_address(arg: &OsString) -> Result<usize, UsageError> {
  let text = arg.to_string_lossy();
  text.parse::<usize>().map_err(|_| UsageError::BadAddress(text.into_owned()))
}

fn parse_args(mut args: Vec<OsString>) -> Result<Command, UsageError> {
  if args.is_empty() {
    return Err(UsageError::NoCommand);
  }
  let command = args.remove(0);

  match &*command.to_string_lossy() {

    "assemble" => {
      let test = args.iter().any(|arg| arg == "--test");
      args.retain(|arg| arg != "--test");
      match args.as_slice() {
        [source, binary] => Ok(Command::Assemble{
          source: PathBuf::from(source),
          binary: PathBuf::from(binary),
          test
        }),
        _ => Err(UsageError::WrongArgumentCount("assemble"))
      }
    }

    "run" => {
      match args.as_slice() {
        [binary, dump] => Ok(Command::Run{
          binary: PathBuf::from(binary),
          dump: PathBuf::from(dump),
          range: DumpRange::default()
        }),
        [binary, dump, start, end] => Ok(Command::Run{
          binary: PathBuf::from(binary),
          dump: PathBuf::from(dump),
          range: DumpRange::new(parse_address(start)?, parse_address(end)?)
        }),
        _ => Err(UsageError::WrongArgumentCount("run"))
      }
    }

    other => Err(UsageError::UnknownCommand(other.to_string()))
  }
}

fn main() -> anyhow::Result<()> {
  let command =
    match parse_args(env::args_os().skip(1).collect()) {
      Ok(command) => command,
      Err(e) => {
        eprintln!("{}", USAGE);
        return Err(e.into());
      }
    };

  match command {

    Command::Assemble{source, binary, test} => {
      let ir = assemble_file(&source, &binary)?;
      if test {
        println!("{}", listing(&ir));
      }
      println!("Assembled {} instructions into {}", ir.len(), binary.display());
    }

    Command::Run{binary, dump, range} => {
      let machine = run_file(&binary, &dump, range, &MachineConfig::default())?;
      println!("{}", machine.program());
      println!("Program finished. Memory dump saved to {}", dump.display());
    }

  }

  Ok(())
}
