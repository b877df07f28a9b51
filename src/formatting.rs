//! formatting renders query output for the CLI.
//!
//! How a value prints is a view over `SqlValue`, not a property of storage;
//! the row separator is a newline and the field separator is `|`, matching
//! the sqlite3 CLI's list mode.

use anyhow::Result;
use itertools::Itertools;
use std::io::Write;

use crate::exec::QueryOutput;

/// Write one line per row, fields joined with `|`.
pub fn write_rows<W: Write>(w: &mut W, output: &QueryOutput) -> Result<()> {
    for row in &output.rows {
        writeln!(w, "{}", row.items.iter().map(|v| v.to_string()).join("|"))?;
    }
    Ok(())
}
