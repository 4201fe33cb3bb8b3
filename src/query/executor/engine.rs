// Query Execution Engine Implementation
//
// Executes statements against the row store. Queries are compiled into an
// operator pipeline whose stages always run in the same order:
//
//   SCAN/JOIN -> FILTER (WHERE) -> GROUP + AGGREGATE -> FILTER (HAVING)
//     -> DISTINCT -> ORDER BY -> LIMIT -> PROJECT
//
// Absent clauses leave their stage out, which is the same as a no-op stage.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::query::executor::ddl_executor::DdlExecutor;
use crate::query::executor::dml_executor::DmlExecutor;
use crate::query::executor::expression_eval::resolve_name;
use crate::query::executor::operators::{
    collect_rows, create_distinct, create_filter, create_hash_aggregate, create_join, create_limit,
    create_projection, create_sort, create_table_scan, AggregateSpec, OperatorRef,
};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, QueryResultSet};
use crate::query::plan::{
    ColumnRef, Expression, InsertSource, OrderByItem, QueryPlan, SelectItem, Source, Statement,
};
use crate::storage::RowStore;

pub struct ExecutionEngine {
    store: Arc<RowStore>,
    config: EngineConfig,
    ddl: DdlExecutor,
    dml: DmlExecutor,
}

impl ExecutionEngine {
    pub fn new(store: Arc<RowStore>, config: EngineConfig) -> Self {
        ExecutionEngine {
            ddl: DdlExecutor::new(store.clone()),
            dml: DmlExecutor::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one statement
    pub fn execute(&self, statement: Statement) -> QueryResult<QueryResultSet> {
        debug!("Executing {}", statement.kind());
        match statement {
            Statement::CreateTable { name, columns, primary_key } => {
                self.ddl.execute_create(&name, columns, primary_key)
            }
            Statement::DropTable { name, if_exists } => self.ddl.execute_drop(&name, if_exists),
            Statement::AlterTable { table, operation } => self.ddl.execute_alter(&table, operation),
            Statement::Insert { table, columns, source } => {
                let rows = match source {
                    InsertSource::Values(rows) => self.dml.evaluate_values(&rows)?,
                    InsertSource::Query(plan) => self
                        .execute_query(&plan)?
                        .into_rows()
                        .into_iter()
                        .map(|row| row.values().cloned().collect::<Vec<DataValue>>())
                        .collect(),
                };
                self.dml.execute_insert(&table, columns.as_deref(), rows)
            }
            Statement::Update { table, assignments, predicate } => {
                self.dml.execute_update(&table, &assignments, predicate.as_ref())
            }
            Statement::Delete { table, predicate } => self.dml.execute_delete(&table, predicate.as_ref()),
            Statement::Truncate { table } => self.dml.execute_truncate(&table),
            Statement::Query(plan) => self.execute_query(&plan),
        }
    }

    /// Run a query plan and collect its rows
    pub fn execute_query(&self, plan: &QueryPlan) -> QueryResult<QueryResultSet> {
        let pipeline = self.build_pipeline(plan)?;
        let columns = pipeline.lock().columns();
        let rows = collect_rows(&pipeline)?;

        let mut result = QueryResultSet::new(columns);
        for row in rows {
            result.add_row(row);
        }
        if let Some(max_rows) = self.config.max_result_rows {
            if result.row_count() > max_rows {
                warn!("Query returned {} rows, truncating to {}", result.row_count(), max_rows);
                result.truncate(max_rows);
            }
        }
        debug!("Query produced {} row(s)", result.row_count());
        Ok(result)
    }

    /// Compile a query plan into its operator pipeline
    pub fn build_pipeline(&self, plan: &QueryPlan) -> QueryResult<OperatorRef> {
        let mut op = self.build_source(&plan.source)?;

        if let Some(filter) = &plan.filter {
            if filter.contains_aggregate() {
                return Err(QueryError::ValidationError(format!(
                    "Aggregate calls are not allowed in WHERE: {}",
                    filter
                )));
            }
            op = create_filter(op, filter.clone(), self.config.clone());
        }

        let order_by = substitute_aliases(&plan.order_by, &plan.projection);
        let mut projection = plan.projection.clone();

        if is_aggregate_query(plan, &order_by) {
            let input_columns = op.lock().columns();
            let group_by = plan
                .group_by
                .iter()
                .map(|c| resolve_name(input_columns.iter().map(|s| s.as_str()), c).map(str::to_string))
                .collect::<QueryResult<Vec<String>>>()?;

            projection = expand_grouped_wildcards(&projection, &input_columns, &group_by)?;

            let mut checked: Vec<&Expression> = projection
                .iter()
                .filter_map(|item| match item {
                    SelectItem::Expr { expr, .. } => Some(expr),
                    _ => None,
                })
                .collect();
            checked.extend(plan.having.iter());
            checked.extend(order_by.iter().map(|item| &item.expr));

            let mut aggregates = Vec::new();
            for expr in &checked {
                ensure_grouped(expr, &input_columns, &group_by)?;
                expr.collect_aggregates(&mut aggregates);
            }
            let specs = aggregates
                .iter()
                .map(AggregateSpec::from_expression)
                .collect::<QueryResult<Vec<_>>>()?;

            debug!("Grouping on {:?} computing {} aggregate(s)", group_by, specs.len());
            op = create_hash_aggregate(op, group_by, specs, plan.having.clone(), self.config.clone());
        }

        if plan.distinct {
            op = create_distinct(op, distinct_keys(&projection), self.config.clone());
        }

        if !order_by.is_empty() {
            op = create_sort(op, order_by, self.config.clone());
        }

        if let Some(limit) = &plan.limit {
            op = create_limit(op, limit.count, limit.offset)?;
        }

        create_projection(op, &projection, self.config.clone())
    }

    fn build_source(&self, source: &Source) -> QueryResult<OperatorRef> {
        match source {
            Source::Table { name, alias } => create_table_scan(&self.store, name, alias.as_deref()),
            Source::Join(spec) => {
                let left = self.build_source(&spec.left)?;
                let right = self.build_source(&spec.right)?;
                debug!("Building {:?} join", spec.kind);
                create_join(left, right, spec.kind, spec.on.clone(), self.config.clone())
            }
        }
    }
}

/// Aggregation applies when anything is grouped or aggregated, or a HAVING
/// clause is present
fn is_aggregate_query(plan: &QueryPlan, order_by: &[OrderByItem]) -> bool {
    !plan.group_by.is_empty()
        || plan.having.is_some()
        || plan.projection.iter().any(|item| match item {
            SelectItem::Expr { expr, .. } => expr.contains_aggregate(),
            _ => false,
        })
        || order_by.iter().any(|item| item.expr.contains_aggregate())
}

/// ORDER BY keys naming a projection alias sort by the aliased expression
fn substitute_aliases(order_by: &[OrderByItem], projection: &[SelectItem]) -> Vec<OrderByItem> {
    order_by
        .iter()
        .map(|item| {
            let aliased = match &item.expr {
                Expression::Column(ColumnRef { table: None, name }) => projection.iter().find_map(|p| match p {
                    SelectItem::Expr { expr, alias: Some(alias) } if alias == name => Some(expr.clone()),
                    _ => None,
                }),
                _ => None,
            };
            OrderByItem {
                expr: aliased.unwrap_or_else(|| item.expr.clone()),
                descending: item.descending,
            }
        })
        .collect()
}

/// Every column used outside an aggregate call must be a grouping column
fn ensure_grouped(expr: &Expression, input_columns: &[String], group_by: &[String]) -> QueryResult<()> {
    let mut bare = Vec::new();
    expr.collect_bare_columns(&mut bare);
    for col_ref in bare {
        let name = resolve_name(input_columns.iter().map(|s| s.as_str()), col_ref)?;
        if !group_by.iter().any(|g| g == name) {
            return Err(QueryError::ValidationError(format!(
                "Column {} must appear in GROUP BY or be used in an aggregate function",
                col_ref
            )));
        }
    }
    Ok(())
}

/// In a grouped query a wildcard may only cover grouping columns; it is
/// replaced by explicit references to them
fn expand_grouped_wildcards(
    projection: &[SelectItem],
    input_columns: &[String],
    group_by: &[String],
) -> QueryResult<Vec<SelectItem>> {
    let mut expanded = Vec::with_capacity(projection.len());
    for item in projection {
        let covered: Vec<&String> = match item {
            SelectItem::Wildcard => input_columns.iter().collect(),
            SelectItem::QualifiedWildcard(table) => {
                let prefix = format!("{}.", table);
                input_columns.iter().filter(|c| c.starts_with(&prefix)).collect()
            }
            SelectItem::Expr { .. } => {
                expanded.push(item.clone());
                continue;
            }
        };
        for column in covered {
            if !group_by.contains(column) {
                return Err(QueryError::ValidationError(format!(
                    "Column {} must appear in GROUP BY or be used in an aggregate function",
                    column
                )));
            }
            expanded.push(SelectItem::expr(Expression::Column(ColumnRef::parse(column))));
        }
    }
    Ok(expanded)
}

/// DISTINCT compares the projected values; a wildcard compares whole rows
fn distinct_keys(projection: &[SelectItem]) -> Vec<Expression> {
    let mut keys = Vec::with_capacity(projection.len());
    for item in projection {
        match item {
            SelectItem::Expr { expr, .. } => keys.push(expr.clone()),
            SelectItem::Wildcard | SelectItem::QualifiedWildcard(_) => return Vec::new(),
        }
    }
    keys
}
