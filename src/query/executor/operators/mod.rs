// Query Operators Module
//
// This module defines the operators used for query execution in the
// iterator-based execution model. Each operator pulls rows from its input
// and hands them on, one `next()` call at a time.

pub mod agg;
pub mod distinct;
pub mod filter;
pub mod join;
pub mod limit;
pub mod project;
pub mod scan;
pub mod sort;
pub mod values;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::query::executor::result::{QueryResult, Row};

pub use self::agg::{create_hash_aggregate, filter_groups, group_rows, AggregateSpec, HashAggregateOperator};
pub use self::distinct::{create_distinct, DistinctOperator};
pub use self::filter::{create_filter, FilterOperator};
pub use self::join::{create_join, union_distinct, FullOuterJoin, NestedLoopJoin};
pub use self::limit::{create_limit, LimitOperator};
pub use self::project::{create_projection, ProjectionOperator};
pub use self::scan::{create_table_scan, TableScanOperator};
pub use self::sort::{create_sort, SortOperator};
pub use self::values::{create_values, ValuesOperator};

/// The Operator trait defines the interface for all query execution operators
/// in the iterator-based execution model. Each operator processes rows and
/// passes them to the next operator in the execution plan.
pub trait Operator: Send + Sync {
    /// Initialize the operator before execution. Calling it again restarts
    /// the operator from its first row.
    fn init(&mut self) -> QueryResult<()>;

    /// Get the next row of data from this operator
    fn next(&mut self) -> QueryResult<Option<Row>>;

    /// Close the operator and release any resources
    fn close(&mut self) -> QueryResult<()>;

    /// Names of the columns every output row carries, in order
    fn columns(&self) -> Vec<String>;
}

/// Shared, lockable handle to an operator
pub type OperatorRef = Arc<Mutex<dyn Operator>>;

/// Wrap an operator into an `OperatorRef`
pub fn into_ref<O: Operator + 'static>(operator: O) -> OperatorRef {
    Arc::new(Mutex::new(operator))
}

/// Run an operator to completion: init, drain, close
pub fn collect_rows(operator: &OperatorRef) -> QueryResult<Vec<Row>> {
    let mut op = operator.lock();
    op.init()?;
    let mut rows = Vec::new();
    while let Some(row) = op.next()? {
        rows.push(row);
    }
    op.close()?;
    Ok(rows)
}
