// Projection Operator Implementation
//
// This module implements the projection operator: it evaluates the SELECT
// list for each row and names the output columns.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_expression, resolve_name, RowContext};
use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};
use crate::query::plan::{Expression, SelectItem};

/// Where an output column's value comes from
#[derive(Debug, Clone)]
enum OutputSource {
    /// Copied from an input column
    Column(String),
    /// Computed per row
    Expr(Expression),
}

/// Unqualified part of a scanned column name; aggregate names stay whole
fn bare_name(column: &str) -> &str {
    if column.contains('(') {
        return column;
    }
    column.split_once('.').map_or(column, |(_, name)| name)
}

/// Projection operator that computes the SELECT list of each input row
pub struct ProjectionOperator {
    /// The input operator
    input: OperatorRef,
    /// Output columns in order
    outputs: Vec<(String, OutputSource)>,
    config: EngineConfig,
    /// Whether the operator is initialized
    initialized: bool,
}

impl ProjectionOperator {
    /// Resolve the SELECT list against the input columns and fix the output
    /// names. Plain column references use the bare column name unless two
    /// outputs would share it, in which case they keep the qualified name.
    pub fn new(input: OperatorRef, items: &[SelectItem], config: EngineConfig) -> QueryResult<Self> {
        let input_columns = input.lock().columns();

        // (preferred name, fallback name, source)
        let mut candidates: Vec<(String, Option<String>, OutputSource)> = Vec::new();
        for item in items {
            match item {
                SelectItem::Wildcard => {
                    for column in &input_columns {
                        candidates.push((
                            bare_name(column).to_string(),
                            Some(column.clone()),
                            OutputSource::Column(column.clone()),
                        ));
                    }
                }
                SelectItem::QualifiedWildcard(table) => {
                    let prefix = format!("{}.", table);
                    let matching: Vec<&String> = input_columns.iter().filter(|c| c.starts_with(&prefix)).collect();
                    if matching.is_empty() {
                        return Err(QueryError::TableNotFound(format!("{} (in {}.*)", table, table)));
                    }
                    for column in matching {
                        candidates.push((
                            bare_name(column).to_string(),
                            Some(column.clone()),
                            OutputSource::Column(column.clone()),
                        ));
                    }
                }
                SelectItem::Expr { expr: Expression::Column(col_ref), alias } => {
                    let resolved = resolve_name(input_columns.iter().map(|c| c.as_str()), col_ref)?.to_string();
                    match alias {
                        Some(alias) => candidates.push((alias.clone(), None, OutputSource::Column(resolved))),
                        None => candidates.push((
                            col_ref.name.clone(),
                            Some(resolved.clone()),
                            OutputSource::Column(resolved),
                        )),
                    }
                }
                SelectItem::Expr { expr, alias } => {
                    let name = alias.clone().unwrap_or_else(|| expr.to_string());
                    candidates.push((name, None, OutputSource::Expr(expr.clone())));
                }
            }
        }

        let mut uses: HashMap<&str, usize> = HashMap::new();
        for (name, _, _) in &candidates {
            *uses.entry(name.as_str()).or_insert(0) += 1;
        }
        let outputs: Vec<(String, OutputSource)> = candidates
            .iter()
            .map(|(name, fallback, source)| {
                let name = match fallback {
                    Some(qualified) if uses[name.as_str()] > 1 => qualified.clone(),
                    _ => name.clone(),
                };
                (name, source.clone())
            })
            .collect();

        let mut seen = HashMap::new();
        for (index, (name, _)) in outputs.iter().enumerate() {
            if seen.insert(name.clone(), index).is_some() {
                return Err(QueryError::ValidationError(format!("Duplicate output column name {}", name)));
            }
        }

        Ok(ProjectionOperator {
            input,
            outputs,
            config,
            initialized: false,
        })
    }

    /// Project a row to the output columns
    fn project_row(&self, row: &Row) -> QueryResult<Row> {
        let ctx = RowContext::single(row);
        let mut projected = Row::new();
        for (name, source) in &self.outputs {
            let value = match source {
                OutputSource::Column(column) => row.get(column).cloned().unwrap_or(DataValue::Null),
                OutputSource::Expr(expr) => evaluate_expression(expr, &ctx, &self.config)?,
            };
            projected.set(name.clone(), value);
        }
        Ok(projected)
    }
}

impl Operator for ProjectionOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.input.lock().init()?;
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        let row = self.input.lock().next()?;
        row.map(|row| self.project_row(&row)).transpose()
    }

    fn close(&mut self) -> QueryResult<()> {
        self.input.lock().close()?;
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.outputs.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Create a projection operator
pub fn create_projection(input: OperatorRef, items: &[SelectItem], config: EngineConfig) -> QueryResult<OperatorRef> {
    Ok(into_ref(ProjectionOperator::new(input, items, config)?))
}
