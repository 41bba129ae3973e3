//! Cell grid normalization.

use sheetdb_common::Cell;

/// Bring a raw grid into canonical form: every row padded on the right to
/// exactly `width` cells, and trailing all-blank rows dropped. Rows wider
/// than `width` are left as the source returned them. Idempotent.
pub fn normalize(mut cells: Vec<Vec<Cell>>, width: usize) -> Vec<Vec<Cell>> {
    for row in &mut cells {
        if row.len() < width {
            row.resize(width, Cell::Empty);
        }
    }
    while cells.last().is_some_and(|row| row.iter().all(Cell::is_blank)) {
        cells.pop();
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
        rows.iter()
            .map(|r| r.iter().map(|c| Cell::from(*c)).collect())
            .collect()
    }

    #[test]
    fn pads_short_rows() {
        let out = normalize(grid(&[&["a"], &["b", "c", "d"]]), 3);
        assert_eq!(out[0], vec![Cell::from("a"), Cell::Empty, Cell::Empty]);
        assert_eq!(out[1].len(), 3);
    }

    #[test]
    fn drops_trailing_blank_rows() {
        let out = normalize(grid(&[&["a", "b"], &["", ""], &[], &[""]]), 2);
        assert_eq!(out.len(), 1);

        let out = normalize(grid(&[&["", ""], &["a", ""]]), 2);
        assert_eq!(out.len(), 2, "interior blank rows stay");
    }

    #[test]
    fn empty_grid_stays_empty() {
        assert!(normalize(Vec::new(), 4).is_empty());
        assert!(normalize(grid(&[&[], &[]]), 4).is_empty());
    }

    #[test]
    fn idempotent() {
        let once = normalize(grid(&[&["a"], &["b", ""], &["", ""]]), 2);
        let twice = normalize(once.clone(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn wide_rows_are_not_truncated() {
        let out = normalize(grid(&[&["a", "b", "c"]]), 2);
        assert_eq!(out[0].len(), 3);
    }
}
