//! In-memory backend.
//!
//! Backs the integration tests and local experimentation with per-sheet
//! growable grids. Understands the A1 range subset the engine emits
//! (`Sheet!A2:D` and `Sheet!A2:D6`) and counts calls so tests can assert
//! on the write-skip policy.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sheetdb_common::Cell;

use crate::client::SheetsClient;
use crate::error::BoxError;

#[derive(Default)]
pub struct MemoryClient {
    sheets: Mutex<FxHashMap<String, Vec<Vec<Cell>>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    last_write: Mutex<Option<(String, Vec<Vec<Cell>>)>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        MemoryClient::default()
    }

    pub fn with_sheet(self, name: impl Into<String>, cells: Vec<Vec<Cell>>) -> Self {
        self.put_sheet(name, cells);
        self
    }

    /// Seed or replace a sheet's grid.
    pub fn put_sheet(&self, name: impl Into<String>, cells: Vec<Vec<Cell>>) {
        self.sheets.lock().insert(name.into(), cells);
    }

    /// The full stored grid for a sheet, header rows included.
    pub fn sheet(&self, name: &str) -> Vec<Vec<Cell>> {
        self.sheets.lock().get(name).cloned().unwrap_or_default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Range and grid of the most recent write, if any.
    pub fn last_write(&self) -> Option<(String, Vec<Vec<Cell>>)> {
        self.last_write.lock().clone()
    }
}

struct ParsedRange {
    sheet: String,
    top: u32,
    left: u32,
    bottom: Option<u32>,
    right: u32,
}

/// Parse `"AB12"`-style cell addresses into (column, optional row).
fn split_cell(addr: &str) -> Result<(u32, Option<u32>), BoxError> {
    let letters: &str = addr
        .split_at(addr.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(addr.len()))
        .0;
    if letters.is_empty() {
        return Err(format!("bad cell address `{addr}`").into());
    }
    let col = letters
        .chars()
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1));
    let digits = &addr[letters.len()..];
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<u32>().map_err(|e| format!("bad row in `{addr}`: {e}"))?)
    };
    Ok((col, row))
}

fn parse_range(range: &str) -> Result<ParsedRange, BoxError> {
    let (sheet, rect) = range
        .split_once('!')
        .ok_or_else(|| format!("range `{range}` has no sheet name"))?;
    let (start, end) = rect
        .split_once(':')
        .ok_or_else(|| format!("range `{range}` is not rectangular"))?;
    let (left, top) = split_cell(start)?;
    let (right, bottom) = split_cell(end)?;
    let top = top.ok_or_else(|| format!("range `{range}` has no top row"))?;
    Ok(ParsedRange {
        sheet: sheet.to_string(),
        top,
        left,
        bottom,
        right,
    })
}

#[async_trait]
impl SheetsClient for MemoryClient {
    async fn read_range(
        &self,
        _source_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Cell>>, BoxError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let r = parse_range(range)?;
        let sheets = self.sheets.lock();
        let Some(grid) = sheets.get(&r.sheet) else {
            return Ok(Vec::new());
        };
        let last_row = r.bottom.unwrap_or(grid.len() as u32).min(grid.len() as u32);
        let mut out = Vec::new();
        for row_no in r.top..=last_row {
            let Some(stored) = grid.get(row_no as usize - 1) else {
                break;
            };
            out.push(
                (r.left..=r.right)
                    .map(|col| stored.get(col as usize - 1).cloned().unwrap_or(Cell::Empty))
                    .collect(),
            );
        }
        Ok(out)
    }

    async fn write_range(
        &self,
        _source_id: &str,
        range: &str,
        cells: &[Vec<Cell>],
    ) -> Result<(), BoxError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let r = parse_range(range)?;
        let height = match r.bottom {
            Some(bottom) => (bottom - r.top + 1) as usize,
            None => cells.len(),
        };
        if cells.len() != height {
            return Err(format!(
                "grid height {} does not match range `{range}`",
                cells.len()
            )
            .into());
        }
        let mut sheets = self.sheets.lock();
        let grid = sheets.entry(r.sheet).or_default();
        for (i, row) in cells.iter().enumerate() {
            let row_ix = (r.top as usize - 1) + i;
            if grid.len() <= row_ix {
                grid.resize(row_ix + 1, Vec::new());
            }
            let stored = &mut grid[row_ix];
            if stored.len() < r.right as usize {
                stored.resize(r.right as usize, Cell::Empty);
            }
            for (j, cell) in row.iter().enumerate() {
                stored[(r.left as usize - 1) + j] = cell.clone();
            }
        }
        *self.last_write.lock() = Some((range.to_string(), cells.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_and_closed_ranges() {
        let r = parse_range("Trades!A2:D").unwrap();
        assert_eq!((r.top, r.left, r.bottom, r.right), (2, 1, None, 4));
        let r = parse_range("Trades!B3:C10").unwrap();
        assert_eq!((r.top, r.left, r.bottom, r.right), (3, 2, Some(10), 3));
        assert!(parse_range("A2:D").is_err());
    }

    #[tokio::test]
    async fn rectangle_round_trip() {
        let client = MemoryClient::new();
        client
            .write_range(
                "src",
                "S!A2:B3",
                &[
                    vec![Cell::from("a"), Cell::from(1.0)],
                    vec![Cell::from("b"), Cell::from(2.0)],
                ],
            )
            .await
            .unwrap();

        let cells = client.read_range("src", "S!A2:B").await.unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1][0], Cell::from("b"));
        assert_eq!(client.reads(), 1);
        assert_eq!(client.writes(), 1);
    }

    #[tokio::test]
    async fn reading_missing_sheet_is_empty() {
        let client = MemoryClient::new();
        assert!(client.read_range("src", "Nope!A2:D").await.unwrap().is_empty());
    }
}
