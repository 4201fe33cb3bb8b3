//! Storage Module
//!
//! In-memory row storage: every table lives behind its own reader/writer
//! lock so scans of one table never observe a write in progress.

pub mod row_store;

pub use self::row_store::{RowStore, StoredTable, TableHandle};
