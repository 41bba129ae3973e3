use thiserror::Error;

/// Boxed error type carried across the client seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SheetError {
    /// Malformed table schema. Fatal at construction.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Column spec referenced a type tag with no registered codec.
    #[error("unknown column type `{tag}` for column `{column}`")]
    UnknownType { column: String, tag: String },

    /// A remote read or write failed; the backend error rides along for
    /// diagnostics. No retry is attempted here.
    #[error("remote {op} failed for `{range}`")]
    Remote {
        op: &'static str,
        range: String,
        #[source]
        source: BoxError,
    },
}

impl SheetError {
    pub(crate) fn remote(op: &'static str, range: &str, source: BoxError) -> Self {
        SheetError::Remote {
            op,
            range: range.to_string(),
            source,
        }
    }
}
