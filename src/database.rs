// Database Facade
//
// Owns the row store and the execution engine and is the entry point for
// callers that just want to run statements.

use std::sync::Arc;

use log::debug;

use crate::config::EngineConfig;
use crate::query::executor::engine::ExecutionEngine;
use crate::query::executor::result::{QueryResult, QueryResultSet};
use crate::query::plan::{QueryPlan, Statement};
use crate::storage::RowStore;

/// An in-memory database
pub struct Database {
    store: Arc<RowStore>,
    engine: ExecutionEngine,
}

impl Database {
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(RowStore::new());
        let engine = ExecutionEngine::new(store.clone(), config);
        Database { store, engine }
    }

    /// Execute a single statement
    pub fn execute(&self, statement: Statement) -> QueryResult<QueryResultSet> {
        self.engine.execute(statement)
    }

    /// Execute statements in order, stopping at the first failure
    pub fn execute_all(&self, statements: impl IntoIterator<Item = Statement>) -> QueryResult<Vec<QueryResultSet>> {
        let mut results = Vec::new();
        for statement in statements {
            results.push(self.execute(statement)?);
        }
        debug!("Executed {} statement(s)", results.len());
        Ok(results)
    }

    /// Run a query plan
    pub fn query(&self, plan: &QueryPlan) -> QueryResult<QueryResultSet> {
        self.engine.execute_query(plan)
    }

    pub fn store(&self) -> &Arc<RowStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::new(EngineConfig::default())
    }
}
