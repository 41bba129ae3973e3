//! Treat a remote spreadsheet as a row-oriented table store: named, typed
//! columns over a rectangular grid of untyped cells, with a diff-aware
//! load/save cycle that skips redundant remote writes.

pub mod client;
pub mod database;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod row;
pub mod schema;
pub mod table;

pub use client::SheetsClient;
pub use database::{DEFAULT_CACHE_TTL, Database};
pub use error::{BoxError, SheetError};
pub use memory::MemoryClient;
pub use normalize::normalize;
pub use row::Row;
pub use schema::{Column, TableDef, TypeCodec, register_type};
pub use table::Table;

// Re-export the shared leaf types for convenience.
pub use sheetdb_common::{Cell, Money, SerialDate, Value};
