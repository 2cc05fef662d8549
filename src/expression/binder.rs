//! Ordinal binding: replaces `@k` placeholders with indexed variables.

use crate::binding::{VarBindingContext, VarResolver};
use crate::expression::ExpressionResult;
use crate::sql::{Expression, WhenClause};
use log::trace;

/// Walks a raw tree left to right and binds every placeholder against a context
///
/// Binding stops at the first placeholder the context cannot hold. Slots marked
/// before that point stay marked.
pub struct OrdinalBinder<'a, R> {
    ctx: &'a mut VarBindingContext<R>,
}

impl<'a, R: VarResolver> OrdinalBinder<'a, R> {
    pub fn new(ctx: &'a mut VarBindingContext<R>) -> Self {
        Self { ctx }
    }

    pub fn bind(&mut self, expr: Expression) -> ExpressionResult<Expression> {
        match expr {
            Expression::Placeholder(ordinal) => {
                let var = self.ctx.bind_ordinal(ordinal)?;
                trace!("bound @{} to slot {} ({})", ordinal, var.index, var.data_type);
                Ok(Expression::IndexedVar(var))
            }

            Expression::NumericConstant(_)
            | Expression::StringConstant(_)
            | Expression::Boolean(_)
            | Expression::Null
            | Expression::IndexedVar(_) => Ok(expr),

            Expression::BinaryOp { left, op, right } => {
                let left = self.bind_boxed(left)?;
                let right = self.bind_boxed(right)?;
                Ok(Expression::BinaryOp { left, op, right })
            }

            Expression::UnaryOp { op, operand } => Ok(Expression::UnaryOp {
                op,
                operand: self.bind_boxed(operand)?,
            }),

            Expression::Cast {
                expression,
                data_type,
            } => Ok(Expression::Cast {
                expression: self.bind_boxed(expression)?,
                data_type,
            }),

            Expression::Annotation {
                expression,
                data_type,
            } => Ok(Expression::Annotation {
                expression: self.bind_boxed(expression)?,
                data_type,
            }),

            Expression::Array(elements) => Ok(Expression::Array(self.bind_all(elements)?)),

            Expression::Function { name, args } => Ok(Expression::Function {
                name,
                args: self.bind_all(args)?,
            }),

            Expression::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                let operand = operand.map(|e| self.bind_boxed(e)).transpose()?;
                let when_clauses = when_clauses
                    .into_iter()
                    .map(|clause| {
                        Ok(WhenClause {
                            condition: self.bind(clause.condition)?,
                            result: self.bind(clause.result)?,
                        })
                    })
                    .collect::<ExpressionResult<Vec<_>>>()?;
                let else_clause = else_clause.map(|e| self.bind_boxed(e)).transpose()?;
                Ok(Expression::Case {
                    operand,
                    when_clauses,
                    else_clause,
                })
            }
        }
    }

    fn bind_boxed(&mut self, expr: Box<Expression>) -> ExpressionResult<Box<Expression>> {
        self.bind(*expr).map(Box::new)
    }

    fn bind_all(&mut self, exprs: Vec<Expression>) -> ExpressionResult<Vec<Expression>> {
        exprs.into_iter().map(|e| self.bind(e)).collect()
    }
}

/// Helper function to bind every placeholder in `expr` against `ctx`
pub fn bind_ordinals<R: VarResolver>(
    expr: Expression,
    ctx: &mut VarBindingContext<R>,
) -> ExpressionResult<Expression> {
    OrdinalBinder::new(ctx).bind(expr)
}
