//! Output formatting boundary: plain tables for humans, `serde_json` for
//! `--json`/`--format json`. Commands build a value and hand it to one of
//! these; nothing downstream of here re-parses what it printed.

use serde::Serialize;

/// Print `value` as pretty JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a simple left-aligned table: one header row, then one row per
/// item. Columns are padded to the widest cell in that column (header
/// included), mirroring the teacher's `{:<N}` formatting convention.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let header_line: String = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i] + 2))
        .collect();
    println!("{}", header_line.trim_end());
    println!("{}", "-".repeat(header_line.trim_end().len()));

    for row in rows {
        let line: String = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0) + 2))
            .collect();
        println!("{}", line.trim_end());
    }
}
