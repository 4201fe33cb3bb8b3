// Query Processing Module
//
// Query plans (the structured input of the engine) and their execution.

pub mod executor;
pub mod plan;

// Export key public interfaces
pub use executor::engine::ExecutionEngine;
pub use executor::result::{QueryResult, QueryResultSet};
pub use plan::{QueryPlan, Statement};
