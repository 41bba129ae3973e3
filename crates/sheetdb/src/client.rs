//! The remote data-source seam.

use async_trait::async_trait;
use sheetdb_common::Cell;

use crate::error::BoxError;

/// Issues the actual range reads and writes against a remote source.
///
/// Implementations own transport, authentication and any retry policy.
/// Reads must return unformatted values with dates as numeric serials;
/// writes must overwrite exactly the addressed rectangle, succeeding or
/// failing as a unit. Callers never invoke a client directly: every call
/// is funnelled through [`Database::exec`](crate::Database::exec) so that
/// calls against one source never interleave.
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Read a rectangular range, addressed in A1 notation
    /// (`"Trades!A2:D"`). Rows the source has no data for may be absent
    /// or ragged; the engine normalizes the result.
    async fn read_range(&self, source_id: &str, range: &str)
    -> Result<Vec<Vec<Cell>>, BoxError>;

    /// Overwrite a rectangular range with the given grid.
    async fn write_range(
        &self,
        source_id: &str,
        range: &str,
        cells: &[Vec<Cell>],
    ) -> Result<(), BoxError>;
}
