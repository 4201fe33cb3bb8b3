// Hash-based Aggregation Operator
//
// This operator implements aggregation using a hash table to group rows.
// Groups are emitted in the order their first row arrived; NULL is an
// ordinary key value.

use linked_hash_map::LinkedHashMap;
use log::debug;

use super::{Accumulator, AggregateSpec};
use crate::config::EngineConfig;
use crate::query::executor::expression_eval::{evaluate_expression, evaluate_predicate, RowContext};
use crate::query::executor::operators::{into_ref, Operator, OperatorRef};
use crate::query::executor::result::{DataValue, QueryError, QueryResult, Row};
use crate::query::plan::Expression;

/// Key for the grouping hash table - combination of values from GROUP BY columns
type GroupKey = Vec<DataValue>;

/// Partition rows by the values of `group_by` and compute `aggregates` for
/// every partition. Each output row holds the group columns followed by one
/// column per aggregate, named by `AggregateSpec::output_name`. Without
/// grouping columns all rows form a single group, which exists even when
/// `rows` is empty.
pub fn group_rows(
    rows: impl IntoIterator<Item = Row>,
    group_by: &[String],
    aggregates: &[AggregateSpec],
    config: &EngineConfig,
) -> QueryResult<Vec<Row>> {
    let mut groups: LinkedHashMap<GroupKey, Vec<Accumulator>> = LinkedHashMap::new();
    let fresh = || aggregates.iter().map(Accumulator::new).collect::<Vec<_>>();

    if group_by.is_empty() {
        groups.insert(Vec::new(), fresh());
    }

    for row in rows {
        let key = group_by
            .iter()
            .map(|column| {
                row.get(column)
                    .cloned()
                    .ok_or_else(|| QueryError::ColumnNotFound(column.clone()))
            })
            .collect::<QueryResult<GroupKey>>()?;

        if !groups.contains_key(&key) {
            groups.insert(key.clone(), fresh());
        }
        let Some(accumulators) = groups.get_mut(&key) else {
            continue;
        };

        let ctx = RowContext::single(&row);
        for (spec, acc) in aggregates.iter().zip(accumulators.iter_mut()) {
            let value = match &spec.arg {
                Some(arg) => Some(evaluate_expression(arg, &ctx, config)?),
                None => None,
            };
            acc.update(value)?;
        }
    }

    let columns: Vec<String> = group_by
        .iter()
        .cloned()
        .chain(aggregates.iter().map(|a| a.output_name.clone()))
        .collect();

    Ok(groups
        .into_iter()
        .map(|(key, accumulators)| {
            let values = key.into_iter().chain(accumulators.iter().map(Accumulator::result)).collect();
            Row::from_values(columns.clone(), values)
        })
        .collect())
}

/// Keep the groups for which `having` is TRUE
pub fn filter_groups(groups: Vec<Row>, having: &Expression, config: &EngineConfig) -> QueryResult<Vec<Row>> {
    let mut kept = Vec::with_capacity(groups.len());
    for group in groups {
        if evaluate_predicate(having, &RowContext::single(&group), config)?.is_true() {
            kept.push(group);
        }
    }
    Ok(kept)
}

/// HashAggregateOperator performs grouping and aggregation using a hash table
pub struct HashAggregateOperator {
    // Input operator
    input: OperatorRef,
    // Resolved input column names to group by
    group_by: Vec<String>,
    // Aggregates to compute
    aggregates: Vec<AggregateSpec>,
    // Having clause (optional)
    having: Option<Expression>,
    config: EngineConfig,
    // Has this operator been initialized
    initialized: bool,
    // Iterator over the resulting rows
    result: std::vec::IntoIter<Row>,
}

impl HashAggregateOperator {
    pub fn new(
        input: OperatorRef,
        group_by: Vec<String>,
        aggregates: Vec<AggregateSpec>,
        having: Option<Expression>,
        config: EngineConfig,
    ) -> Self {
        HashAggregateOperator {
            input,
            group_by,
            aggregates,
            having,
            config,
            initialized: false,
            result: Vec::new().into_iter(),
        }
    }
}

impl Operator for HashAggregateOperator {
    fn init(&mut self) -> QueryResult<()> {
        let mut rows = Vec::new();
        {
            let mut input = self.input.lock();
            input.init()?;
            while let Some(row) = input.next()? {
                rows.push(row);
            }
            input.close()?;
        }

        let input_rows = rows.len();
        let mut groups = group_rows(rows, &self.group_by, &self.aggregates, &self.config)?;
        let group_count = groups.len();
        if let Some(having) = &self.having {
            groups = filter_groups(groups, having, &self.config)?;
        }
        debug!(
            "Aggregated {} row(s) into {} group(s), {} after HAVING",
            input_rows,
            group_count,
            groups.len()
        );

        self.result = groups.into_iter();
        self.initialized = true;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Row>> {
        if !self.initialized {
            self.init()?;
        }
        Ok(self.result.next())
    }

    fn close(&mut self) -> QueryResult<()> {
        self.result = Vec::new().into_iter();
        self.initialized = false;
        Ok(())
    }

    fn columns(&self) -> Vec<String> {
        self.group_by
            .iter()
            .cloned()
            .chain(self.aggregates.iter().map(|a| a.output_name.clone()))
            .collect()
    }
}

/// Create a new HashAggregateOperator
pub fn create_hash_aggregate(
    input: OperatorRef,
    group_by: Vec<String>,
    aggregates: Vec<AggregateSpec>,
    having: Option<Expression>,
    config: EngineConfig,
) -> OperatorRef {
    into_ref(HashAggregateOperator::new(input, group_by, aggregates, having, config))
}
