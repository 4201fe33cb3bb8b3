// minirel: a minimal relational query engine
//
// Tables live in an in-memory row store; structured query plans are run
// through an iterator-based operator pipeline.

pub mod catalog;
pub mod config;
pub mod database;
pub mod demo;
pub mod query;
pub mod storage;

// Re-export key items for convenient access
pub use catalog::{Column, DataType, Table};
pub use config::EngineConfig;
pub use database::Database;
pub use query::executor::engine::ExecutionEngine;
pub use query::executor::result::{DataValue, ErrorKind, QueryError, QueryResult, QueryResultSet, Row};
pub use query::plan::{QueryPlan, Statement};
pub use storage::RowStore;
