//! Expression preparation pipeline.
//!
//! `process_expression` runs Parse -> Bind -> Resolve -> Fold over one
//! expression. The first failing step ends the call; slots marked in the
//! binding context before the failure stay marked.
//!
//! ```text
//! "@1 * (@2 + @3) + @1"
//!     parse   -> raw tree with placeholders
//!     bind    -> placeholders become indexed vars, slots 0..=2 marked
//!     resolve -> typed tree
//!     fold    -> constant subtrees replaced by literals
//! ```

use crate::access::{DataType, Value};
use crate::binding::{VarBindingContext, VarResolver};
use crate::expression::{
    self, EvalContext, Expression, ExpressionError, ExpressionEvaluator, ExpressionResult,
    Literal, SemaContext,
};
use crate::flow::ExpressionSpec;
use crate::sql;
use log::debug;
use std::fmt;

/// Result of preparing one expression
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedExpression {
    /// Expression still depends on the row
    Tree(Expression),
    /// Whole expression folded to a single value
    ///
    /// The literal keeps the resolved type, so `NULL = NULL` is still a BOOL
    /// even though its value is NULL.
    Datum(Literal),
}

impl ProcessedExpression {
    fn from_folded(expr: Expression) -> Self {
        match expr {
            Expression::Literal(lit) => ProcessedExpression::Datum(lit),
            other => ProcessedExpression::Tree(other),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ProcessedExpression::Tree(expr) => expr.data_type(),
            ProcessedExpression::Datum(lit) => lit.data_type.clone(),
        }
    }

    pub fn as_datum(&self) -> Option<&Value> {
        match self {
            ProcessedExpression::Datum(lit) => Some(&lit.value),
            ProcessedExpression::Tree(_) => None,
        }
    }

    /// Evaluate against one row of the shape the expression was bound to
    pub fn evaluate(&self, row: &[Value], ctx: &EvalContext) -> ExpressionResult<Value> {
        match self {
            ProcessedExpression::Tree(expr) => ExpressionEvaluator::new(row, ctx).evaluate(expr),
            ProcessedExpression::Datum(lit) => Ok(lit.value.clone()),
        }
    }
}

impl fmt::Display for ProcessedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessedExpression::Tree(expr) => write!(f, "{}", expr),
            ProcessedExpression::Datum(lit) => write!(f, "{}", lit.value),
        }
    }
}

/// Parse expression text into a raw tree
pub fn parse(text: &str) -> ExpressionResult<sql::Expression> {
    sql::parse_expression(text).map_err(ExpressionError::from)
}

/// Bind every `@k` in `expr` against `vars`
pub fn bind_ordinals<R: VarResolver>(
    expr: sql::Expression,
    vars: &mut VarBindingContext<R>,
) -> ExpressionResult<sql::Expression> {
    expression::bind_ordinals(expr, vars)
}

/// Give every node of a bound tree its type
pub fn resolve_types(expr: &sql::Expression, sema: &SemaContext) -> ExpressionResult<Expression> {
    expression::resolve_types(expr, sema)
}

/// Fold constant subtrees
pub fn fold_constants(expr: Expression, ctx: &EvalContext) -> ExpressionResult<Expression> {
    expression::fold_constants(expr, ctx)
}

/// Prepare one expression for repeated evaluation
///
/// Every slot the expression references is marked in `vars`, and those marks
/// accumulate across calls that share the context. Calls sharing a context
/// must not overlap; `&mut` makes that the caller's problem.
pub fn process_expression<R: VarResolver>(
    spec: &ExpressionSpec,
    eval_ctx: &EvalContext,
    sema_ctx: &SemaContext,
    vars: &mut VarBindingContext<R>,
) -> ExpressionResult<ProcessedExpression> {
    debug!("processing expression {:?}", spec.expr);

    let raw = parse(&spec.expr)?;
    let bound = bind_ordinals(raw, vars)?;
    debug!("bound {:?}, referenced slots {:?}", spec.expr, vars.referenced_slots());

    let typed = resolve_types(&bound, sema_ctx)?;
    debug!("resolved {} as {}", typed, typed.data_type());

    let folded = fold_constants(typed, eval_ctx)?;
    let processed = ProcessedExpression::from_folded(folded);
    debug!("prepared {}", processed);

    Ok(processed)
}
