//! A1-style addressing for the remote grid.
//!
//! Columns are 1-based and render as base-26 letter labels (A, B, ..., Z,
//! AA, ...). A `None` row denotes an open-ended bound and renders as the
//! bare column label, so `range_address(2, 1, None, 4)` yields `"A2:D"`.

/// Convert a 1-based column index into its letter label.
pub fn column_name(col: u32) -> String {
    debug_assert!(col >= 1, "columns are 1-based");
    let mut label = String::new();
    let mut n = col;
    while n > 0 {
        let rem = match n % 26 {
            0 => 26,
            r => r,
        };
        label.insert(0, (b'A' + (rem - 1) as u8) as char);
        n = (n - 1) / 26;
    }
    label
}

/// Render a cell address. `row == None` means "unbounded" and produces the
/// bare column label.
pub fn cell_address(row: Option<u32>, col: u32) -> String {
    match row {
        Some(row) => format!("{}{}", column_name(col), row),
        None => column_name(col),
    }
}

/// Render a rectangular range from its top-left corner and extent.
/// `height == None` leaves the bottom edge open.
pub fn range_address(top: u32, left: u32, height: Option<u32>, width: u32) -> String {
    let right = left + width - 1;
    let bottom = height.map(|h| top + h - 1);
    format!(
        "{}:{}",
        cell_address(Some(top), left),
        cell_address(bottom, right)
    )
}
