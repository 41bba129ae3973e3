//! The table sync engine.
//!
//! One `Table` owns the schema, the TTL-bound cell cache and the current
//! in-memory dataset for a single remote sheet, and drives the idempotent
//! load/save protocol: decode on load, sort + dedup + encode on save, and
//! a deep diff against the previous grid so an unchanged dataset never
//! touches the remote source.

use std::cmp::Ordering;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use sheetdb_common::{Cell, address};

use crate::database::DatabaseCore;
use crate::error::SheetError;
use crate::normalize::normalize;
use crate::row::Row;
use crate::schema::{Column, TableDef, parse_columns, split_list};

/// Data starts on row 2; row 1 holds the header.
const FIRST_DATA_ROW: u32 = 2;

static EMPTY_CELL: Cell = Cell::Empty;

/// Async post-save hook, invoked with the final dataset.
pub type AfterSave =
    Box<dyn for<'a> Fn(&'a [Row]) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> + Send + Sync>;

struct CacheEntry {
    cells: Vec<Vec<Cell>>,
    taken: Instant,
}

pub struct Table {
    core: Arc<DatabaseCore>,
    name: String,
    sheet: String,
    columns: Vec<Column>,
    sort: Vec<String>,
    unique: Vec<String>,
    cache: Option<CacheEntry>,
    rows: Vec<Row>,
    after_save: Option<AfterSave>,
}

impl Table {
    pub(crate) fn new(
        core: Arc<DatabaseCore>,
        name: String,
        def: TableDef,
    ) -> Result<Self, SheetError> {
        if def.sheet.is_empty() {
            return Err(SheetError::Schema(format!(
                "table `{name}` has no sheet name"
            )));
        }
        let columns = parse_columns(&def.cols)?;
        let sort = parse_column_list(&name, def.sort.as_deref(), &columns)?;
        let unique = parse_column_list(&name, def.unique.as_deref(), &columns)?;
        Ok(Table {
            core,
            name,
            sheet: def.sheet,
            columns,
            sort,
            unique,
            cache: None,
            rows: Vec::new(),
            after_save: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The current in-memory dataset.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Register a hook invoked (and awaited) after every save, whether or
    /// not the save skipped the remote write.
    pub fn set_after_save<F>(&mut self, hook: F)
    where
        F: for<'a> Fn(&'a [Row]) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>
            + Send
            + Sync
            + 'static,
    {
        self.after_save = Some(Box::new(hook));
    }

    /// Replace the in-memory dataset with the decoded remote grid and
    /// return it. Served from cache while the cache is fresh; `force`
    /// drops the cache first. Never writes.
    pub async fn load(&mut self, force: bool) -> Result<&[Row], SheetError> {
        if force {
            self.cache = None;
        }
        let cells = match self.cached_cells() {
            Some(cells) => cells,
            None => self.read_cells().await?,
        };
        self.rows = cells.iter().map(|row| self.decode_row(row)).collect();
        tracing::debug!(table = %self.name, rows = self.rows.len(), "loaded");
        Ok(&self.rows)
    }

    /// Persist the dataset: apply the sort and unique specs, encode, and
    /// write only if the encoded grid differs from the previous one. When
    /// the dataset shrank, the write is padded with blank trailer rows so
    /// removed rows are physically blanked rather than left stale.
    ///
    /// `data` replaces the in-memory dataset first; `force` drops the
    /// cache so the comparison base is a fresh read. At most one read and
    /// one write are issued per call.
    pub async fn save(&mut self, data: Option<Vec<Row>>, force: bool) -> Result<(), SheetError> {
        if force {
            self.cache = None;
        }
        if let Some(rows) = data {
            self.rows = rows;
        }
        if !self.sort.is_empty() {
            sort_rows(&mut self.rows, &self.sort);
        }
        if !self.unique.is_empty() {
            self.rows = dedup_rows(std::mem::take(&mut self.rows), &self.unique);
        }

        let cells: Vec<Vec<Cell>> = self.rows.iter().map(|row| self.encode_row(row)).collect();
        let prev = match self.cached_cells() {
            Some(cells) => cells,
            None => self.read_cells().await?,
        };
        if prev == cells {
            tracing::debug!(table = %self.name, rows = cells.len(), "no change, skipping write");
        } else {
            let blanks = prev.len().saturating_sub(cells.len());
            self.write_cells(cells, blanks).await?;
        }

        if let Some(hook) = &self.after_save {
            hook(&self.rows).await;
        }
        Ok(())
    }

    // ---- cache ----------------------------------------------------------

    fn cached_cells(&mut self) -> Option<Vec<Vec<Cell>>> {
        match &self.cache {
            Some(entry) if entry.taken.elapsed() < self.core.cache_ttl => {
                Some(entry.cells.clone())
            }
            Some(_) => {
                self.cache = None;
                None
            }
            None => None,
        }
    }

    fn store_cache(&mut self, cells: Vec<Vec<Cell>>) {
        self.cache = Some(CacheEntry {
            cells,
            taken: Instant::now(),
        });
    }

    // ---- codec plumbing -------------------------------------------------

    fn decode_row(&self, cells: &[Cell]) -> Row {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell = cells.get(i).unwrap_or(&EMPTY_CELL);
                (col.name.clone(), col.from_sheet(cell))
            })
            .collect()
    }

    fn encode_row(&self, row: &Row) -> Vec<Cell> {
        self.columns
            .iter()
            .map(|col| col.to_sheet(row.get(&col.name)))
            .collect()
    }

    // ---- remote IO (always under the source's exec lock) ----------------

    async fn read_cells(&mut self) -> Result<Vec<Vec<Cell>>, SheetError> {
        let width = self.columns.len();
        let range = format!(
            "{}!{}",
            self.sheet,
            address::range_address(FIRST_DATA_ROW, 1, None, width as u32)
        );
        let cells = self
            .core
            .exec(self.core.client.read_range(&self.core.source_id, &range))
            .await
            .map_err(|e| SheetError::remote("read", &range, e))?;
        let cells = normalize(cells, width);
        tracing::debug!(table = %self.name, rows = cells.len(), "rows fetched");
        self.store_cache(cells.clone());
        Ok(cells)
    }

    async fn write_cells(
        &mut self,
        cells: Vec<Vec<Cell>>,
        blank_rows: usize,
    ) -> Result<(), SheetError> {
        let width = self.columns.len();
        let mut grid = cells.clone();
        grid.extend((0..blank_rows).map(|_| vec![Cell::Empty; width]));
        let range = format!(
            "{}!{}",
            self.sheet,
            address::range_address(FIRST_DATA_ROW, 1, Some(grid.len() as u32), width as u32)
        );
        self.store_cache(cells);
        self.core
            .exec(self.core.client.write_range(&self.core.source_id, &range, &grid))
            .await
            .map_err(|e| SheetError::remote("write", &range, e))?;
        tracing::debug!(
            table = %self.name,
            rows = grid.len() - blank_rows,
            blanks = blank_rows,
            "rows written"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("sheet", &self.sheet)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

/// Stable multi-key ascending sort; each later key breaks ties of the
/// previous one.
fn sort_rows(rows: &mut [Row], keys: &[String]) {
    rows.sort_by(|a, b| {
        keys.iter()
            .map(|key| a.get(key).cmp_sort(b.get(key)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Collapse rows sharing a unique-key tuple, last write winning, with the
/// surviving rows in first-seen key order.
fn dedup_rows(rows: Vec<Row>, keys: &[String]) -> Vec<Row> {
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut out: Vec<Row> = Vec::with_capacity(rows.len());
    for row in rows {
        let key = keys
            .iter()
            .map(|k| row.get(k).to_string())
            .collect::<Vec<_>>()
            .join("|");
        match index.get(&key) {
            Some(&slot) => out[slot] = row,
            None => {
                index.insert(key, out.len());
                out.push(row);
            }
        }
    }
    out
}

/// Resolve an optional comma/space separated column list against the
/// parsed schema, failing fast on names the schema does not declare.
fn parse_column_list(
    table: &str,
    spec: Option<&str>,
    columns: &[Column],
) -> Result<Vec<String>, SheetError> {
    let Some(spec) = spec else {
        return Ok(Vec::new());
    };
    let mut names = Vec::new();
    for token in split_list(spec) {
        if !columns.iter().any(|c| c.name == token) {
            return Err(SheetError::Schema(format!(
                "table `{table}` references undeclared column `{token}`"
            )));
        }
        names.push(token.to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetdb_common::Value;

    fn row(ticker: &str, qty: f64) -> Row {
        Row::new().with("ticker", ticker).with("qty", qty)
    }

    #[test]
    fn sort_is_stable_and_multi_key() {
        let mut rows = vec![
            row("B", 2.0).with("tag", "first"),
            row("A", 9.0),
            row("B", 1.0).with("tag", "second"),
            row("B", 1.0).with("tag", "third"),
        ];
        sort_rows(&mut rows, &["ticker".into(), "qty".into()]);
        assert_eq!(rows[0].get("ticker"), &Value::Text("A".into()));
        assert_eq!(rows[1].get("tag"), &Value::Text("second".into()));
        assert_eq!(rows[2].get("tag"), &Value::Text("third".into()));
        assert_eq!(rows[3].get("tag"), &Value::Text("first".into()));
    }

    #[test]
    fn dedup_keeps_last_write_in_first_seen_order() {
        let rows = vec![row("X", 1.0), row("Y", 5.0), row("X", 2.0)];
        let out = dedup_rows(rows, &["ticker".into()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("ticker"), &Value::Text("X".into()));
        assert_eq!(out[0].get("qty"), &Value::Number(2.0));
        assert_eq!(out[1].get("ticker"), &Value::Text("Y".into()));
    }

    #[test]
    fn dedup_joins_multi_column_keys_with_pipes() {
        let a = Row::new().with("a", "x").with("b", "y").with("n", 1.0);
        let b = Row::new().with("a", "x").with("b", "y").with("n", 2.0);
        let c = Row::new().with("a", "x").with("b", "z").with("n", 3.0);
        let out = dedup_rows(vec![a, b, c], &["a".into(), "b".into()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("n"), &Value::Number(2.0));
    }
}
