// Join Operators Module
//
// Every join kind runs through a nested-loop join. Right-handed kinds swap
// the inputs and restore the column order on output; FULL joins are the
// duplicate-eliminating union of the left and the right join.

mod nested_loop;
mod union;

pub use self::nested_loop::NestedLoopJoin;
pub use self::union::{union_distinct, FullOuterJoin};

use log::debug;

use crate::config::EngineConfig;
use crate::query::executor::operators::{into_ref, OperatorRef};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::query::plan::{Expression, JoinKind};

/// What a nested-loop pass emits for each outer row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopMode {
    /// Matching pairs only
    Matches,
    /// Matching pairs, or the outer row padded with NULLs
    Outer,
    /// The outer row padded with NULLs, only when nothing matched
    Anti,
    /// Every pair, no condition
    Cross,
}

/// Create the operator for one join
pub fn create_join(
    left: OperatorRef,
    right: OperatorRef,
    kind: JoinKind,
    condition: Option<Expression>,
    config: EngineConfig,
) -> QueryResult<OperatorRef> {
    if condition.is_none() && !matches!(kind, JoinKind::Cross) {
        return Err(QueryError::ValidationError(format!(
            "{:?} join requires a join condition",
            kind
        )));
    }
    let left_columns = left.lock().columns();
    let right_columns = right.lock().columns();
    if let Some(shared) = left_columns.iter().find(|name| right_columns.contains(name)) {
        return Err(QueryError::ValidationError(format!(
            "duplicate table alias in join: column '{}' appears on both sides",
            shared
        )));
    }
    if condition.is_some() && kind == JoinKind::Cross {
        debug!("Ignoring join condition of CROSS join");
    }

    let join = match kind {
        JoinKind::Inner => into_ref(NestedLoopJoin::new(left, right, condition, LoopMode::Matches, false, config)),
        JoinKind::Left => into_ref(NestedLoopJoin::new(left, right, condition, LoopMode::Outer, false, config)),
        JoinKind::AntiLeft => into_ref(NestedLoopJoin::new(left, right, condition, LoopMode::Anti, false, config)),
        JoinKind::Cross => into_ref(NestedLoopJoin::new(left, right, None, LoopMode::Cross, false, config)),
        // Right-handed kinds loop over the right input
        JoinKind::Right => into_ref(NestedLoopJoin::new(right, left, condition, LoopMode::Outer, true, config)),
        JoinKind::AntiRight => into_ref(NestedLoopJoin::new(right, left, condition, LoopMode::Anti, true, config)),
        JoinKind::Full => into_ref(FullOuterJoin::new(left, right, condition, config)),
    };
    Ok(join)
}
