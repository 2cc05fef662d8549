//! Expressions as they travel inside a stage description.
//!
//! A stage receives its expressions as [`ExpressionSpec`] payloads and
//! prepares them with one [`StageExpressions`], which owns the binding context
//! for the stage's input row shape. After every expression is added,
//! `needed_columns` tells the stage which input columns it has to produce.

use crate::access::Value;
use crate::binding::{RowShape, VarBindingContext, VarResolver};
use crate::expression::{EvalContext, ExpressionError, ExpressionResult, SemaContext};
use crate::pipeline::{process_expression, ProcessedExpression};
use log::debug;
use serde::{Deserialize, Serialize};

/// Serialized form of one expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionSpec {
    /// Expression text, with `@k` referring to column k of the input row
    pub expr: String,
}

impl ExpressionSpec {
    pub fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    /// Serialize the spec to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize a spec produced by [`ExpressionSpec::encode`]
    pub fn decode(bytes: &[u8]) -> ExpressionResult<Self> {
        bincode::deserialize(bytes).map_err(|e| ExpressionError::Parse {
            message: format!("malformed expression payload: {}", e),
        })
    }
}

impl From<&str> for ExpressionSpec {
    fn from(expr: &str) -> Self {
        Self::new(expr)
    }
}

/// The prepared expressions of one stage and the binding context they share
pub struct StageExpressions<R = RowShape> {
    vars: VarBindingContext<R>,
    eval_ctx: EvalContext,
    sema_ctx: SemaContext,
    exprs: Vec<ProcessedExpression>,
}

impl<R: VarResolver> StageExpressions<R> {
    pub fn new(vars: VarBindingContext<R>, eval_ctx: EvalContext, sema_ctx: SemaContext) -> Self {
        Self {
            vars,
            eval_ctx,
            sema_ctx,
            exprs: Vec::new(),
        }
    }

    /// Prepare one more expression against the stage's input
    ///
    /// A failed expression is not kept, but any slots it bound before failing
    /// remain marked.
    pub fn add(&mut self, spec: &ExpressionSpec) -> ExpressionResult<&ProcessedExpression> {
        let processed = process_expression(spec, &self.eval_ctx, &self.sema_ctx, &mut self.vars)?;
        let index = self.exprs.len();
        self.exprs.push(processed);
        debug!(
            "stage expression {} prepared, needed columns now {:?}",
            index,
            self.needed_columns()
        );
        Ok(&self.exprs[index])
    }

    /// Prepare several expressions in order, stopping at the first failure
    pub fn add_all<'s, I>(&mut self, specs: I) -> ExpressionResult<()>
    where
        I: IntoIterator<Item = &'s ExpressionSpec>,
    {
        for spec in specs {
            self.add(spec)?;
        }
        Ok(())
    }

    pub fn expressions(&self) -> &[ProcessedExpression] {
        &self.exprs
    }

    /// Input columns referenced by any expression added so far
    pub fn needed_columns(&self) -> Vec<usize> {
        self.vars.referenced_slots()
    }

    pub fn bindings(&self) -> &VarBindingContext<R> {
        &self.vars
    }

    /// Evaluate every prepared expression against one input row
    pub fn evaluate_row(&self, row: &[Value]) -> ExpressionResult<Vec<Value>> {
        self.exprs
            .iter()
            .map(|expr| expr.evaluate(row, &self.eval_ctx))
            .collect()
    }
}

impl StageExpressions<RowShape> {
    /// Stage over rows of `shape` with default contexts
    pub fn for_row_shape(shape: RowShape) -> Self {
        Self::new(
            VarBindingContext::for_row_shape(shape),
            EvalContext::default(),
            SemaContext::default(),
        )
    }
}
