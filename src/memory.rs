/*!
  The machine's data memory: a fixed number of integer cells, addressed from zero.

  Addresses come out of the instruction stream as unsigned field values, or out of memory
  itself as signed values in the case of `ldm`. Either way, an address is usable only if it lands
  in `[0, len)`. The checked accessors return `None` for anything else so the interpreter can
  cancel an instruction before touching any cell.
*/

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fs;
use std::ops::{Index, IndexMut};
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::bytecode::Word;
use crate::config::DumpRange;
use crate::error::Error;

/// Contents of a memory cell.
pub type Value = i64;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
  cells: Vec<Value>
}

impl Memory {
  pub fn new(size: usize) -> Memory {
    Memory{ cells: vec![0; size] }
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// Converts an instruction operand to an index, if it is in bounds.
  pub fn resolve(&self, address: Word) -> Option<usize> {
    usize::try_from(address).ok().filter(|idx| *idx < self.len())
  }

  /// Converts a cell value used as an address to an index, if it is in bounds. Negative values
  /// are never in bounds.
  pub fn resolve_value(&self, value: Value) -> Option<usize> {
    usize::try_from(value).ok().filter(|idx| *idx < self.len())
  }

  pub fn get(&self, address: Word) -> Option<Value> {
    self.resolve(address).map(|idx| self.cells[idx])
  }

  /// Writes `value` at `address`. Returns `false` and leaves memory untouched if the address is
  /// out of bounds.
  pub fn set(&mut self, address: Word, value: Value) -> bool {
    match self.resolve(address) {
      Some(idx) => {
        self.cells[idx] = value;
        true
      }
      None => false
    }
  }

  /// Iterates over `(address, value)` for every nonzero cell.
  pub fn nonzero(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
    self.cells
        .iter()
        .enumerate()
        .filter(|(_, value)| **value != 0)
        .map(|(address, value)| (address, *value))
  }

  /// Collects the nonzero cells of `[start, min(end, len))`.
  pub fn dump(&self, range: DumpRange) -> MemoryDump {
    let range = range.clamp(self.len());
    let entries =
      self.cells[range.clone()]
          .iter()
          .zip(range)
          .filter(|(value, _)| **value != 0)
          .map(|(value, address)| (address, *value))
          .collect();
    MemoryDump{ entries }
  }
}

impl Index<usize> for Memory {
  type Output = Value;

  fn index(&self, idx: usize) -> &Value {
    &self.cells[idx]
  }
}

impl IndexMut<usize> for Memory {
  fn index_mut(&mut self, idx: usize) -> &mut Value {
    &mut self.cells[idx]
  }
}

/**
  The nonzero cells of a memory range, ordered by address. Serializes as a map from the address,
  written as a string, to the cell value:

  ```text
  {
    "5": 17,
    "2000": 200
  }
  ```
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemoryDump {
  entries: BTreeMap<usize, Value>
}

impl MemoryDump {
  pub fn get(&self, address: usize) -> Option<Value> {
    self.entries.get(&address).copied()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
    self.entries.iter().map(|(address, value)| (*address, *value))
  }

  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }

  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
    fs::write(path, self.to_json()?)?;
    Ok(())
  }
}

impl Serialize for MemoryDump {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer
  {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (address, value) in self.entries.iter() {
      map.serialize_entry(&address.to_string(), value)?;
    }
    map.end()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn bounds() {
    let mut memory = Memory::new(10);
    assert_eq!(memory.len(), 10);
    assert_eq!(memory.get(9), Some(0));
    assert_eq!(memory.get(10), None);
    assert!(memory.set(9, 4));
    assert!(!memory.set(10, 4));
    assert_eq!(memory[9], 4);
    assert_eq!(memory.resolve_value(-1), None);
    assert_eq!(memory.resolve_value(3), Some(3));
    assert_eq!(memory.resolve_value(10), None);
  }

  #[test]
  fn dump_only_nonzero_in_range() {
    let mut memory = Memory::new(4096);
    memory.set(5, 17);
    memory.set(2000, 200);
    memory.set(3000, 1);

    let dump = memory.dump(DumpRange::new(0, 2100));
    assert_eq!(dump.len(), 2);
    assert_eq!(serde_json::to_value(&dump).unwrap(), json!({"5": 17, "2000": 200}));
    assert_eq!(dump.iter().collect::<Vec<_>>(), vec![(5, 17), (2000, 200)]);
  }

  #[test]
  fn dump_clipped_to_memory() {
    let mut memory = Memory::new(100);
    memory.set(99, 7);
    memory.set(0, 3);

    let dump = memory.dump(DumpRange::new(50, 1000));
    assert_eq!(dump.get(99), Some(7));
    assert_eq!(dump.get(0), None);
    assert!(memory.dump(DumpRange::new(200, 300)).is_empty());
  }

  #[test]
  fn json_keys_in_address_order() {
    let mut memory = Memory::new(3000);
    memory.set(2000, 1);
    memory.set(5, 2);
    let text = memory.dump(DumpRange::new(0, 3000)).to_json().unwrap();
    assert_eq!(text, "{\n  \"5\": 2,\n  \"2000\": 1\n}");
    assert_eq!(MemoryDump::default().to_json().unwrap(), "{}");
  }
}
