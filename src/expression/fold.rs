//! Constant folding.

use crate::expression::{EvalContext, Expression, ExpressionEvaluator, ExpressionResult, Literal};
use log::debug;

/// Replaces constant subtrees with the literal they evaluate to
///
/// Folding is bottom-up: children are folded first, then a node whose
/// children are all literals is evaluated through [`ExpressionEvaluator`]
/// with an empty row. An evaluation error aborts the fold, so an expression
/// such as `1/0` is rejected while it is being prepared rather than on the
/// first row.
pub struct ConstantFolder<'a> {
    ctx: &'a EvalContext,
}

impl<'a> ConstantFolder<'a> {
    pub fn new(ctx: &'a EvalContext) -> Self {
        Self { ctx }
    }

    pub fn fold(&self, expr: Expression) -> ExpressionResult<Expression> {
        let expr = self.fold_children(expr)?;
        // Constant children are literals by now, so only this node is left
        if matches!(expr, Expression::Literal(_)) || !expr.is_constant() {
            return Ok(expr);
        }

        let value = ExpressionEvaluator::new(&[], self.ctx).evaluate(&expr)?;
        debug!("folded {} to {}", expr, value);
        Ok(Expression::Literal(Literal {
            value,
            data_type: expr.data_type(),
        }))
    }

    fn fold_children(&self, expr: Expression) -> ExpressionResult<Expression> {
        Ok(match expr {
            Expression::Literal(_) | Expression::Variable(_) => expr,

            Expression::BinaryOp {
                op,
                left,
                right,
                data_type,
            } => Expression::BinaryOp {
                op,
                left: self.fold_boxed(left)?,
                right: self.fold_boxed(right)?,
                data_type,
            },

            Expression::UnaryOp {
                op,
                operand,
                data_type,
            } => Expression::UnaryOp {
                op,
                operand: self.fold_boxed(operand)?,
                data_type,
            },

            Expression::Cast { operand, data_type } => Expression::Cast {
                operand: self.fold_boxed(operand)?,
                data_type,
            },

            Expression::Array {
                elements,
                element_type,
            } => Expression::Array {
                elements: self.fold_all(elements)?,
                element_type,
            },

            Expression::FunctionCall {
                function,
                args,
                data_type,
            } => Expression::FunctionCall {
                function,
                args: self.fold_all(args)?,
                data_type,
            },

            Expression::Case {
                conditions,
                else_result,
                data_type,
            } => Expression::Case {
                conditions: conditions
                    .into_iter()
                    .map(|(cond, res)| Ok((self.fold(cond)?, self.fold(res)?)))
                    .collect::<ExpressionResult<Vec<_>>>()?,
                else_result: else_result.map(|e| self.fold_boxed(e)).transpose()?,
                data_type,
            },
        })
    }

    fn fold_boxed(&self, expr: Box<Expression>) -> ExpressionResult<Box<Expression>> {
        self.fold(*expr).map(Box::new)
    }

    fn fold_all(&self, exprs: Vec<Expression>) -> ExpressionResult<Vec<Expression>> {
        exprs.into_iter().map(|e| self.fold(e)).collect()
    }
}

/// Helper function to fold every constant subtree of `expr`
pub fn fold_constants(expr: Expression, ctx: &EvalContext) -> ExpressionResult<Expression> {
    ConstantFolder::new(ctx).fold(expr)
}
