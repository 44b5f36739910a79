//! Shared styling for the diagnostic tables printed by the machine and the assembler.

use std::fmt::Display;

use prettytable::{format as TableFormat, Table};

lazy_static! {
  pub static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

/// Builds a two column address/contents table, one row per `(address, contents)` pair.
pub fn make_address_table<A, T>(name: char, rows: &[(A, T)]) -> Table
  where A: Display,
        T: Display
{
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Address", ubl->"Contents"]);

  for (address, contents) in rows {
    table.add_row(row![r->format!("{}[{}] =", name, address), contents]);
  }
  table
}
