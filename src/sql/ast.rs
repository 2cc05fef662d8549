// Raw expression syntax tree, as produced by the parser

use crate::access::DataType;
use crate::expression::{BinaryOperator, IndexedVar, UnaryOperator};

/// Untyped expression tree
///
/// Constants keep their source text so the type resolver can give them a type
/// from context. `Placeholder` only exists between parsing and ordinal
/// binding; the binder replaces each one with an `IndexedVar`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    NumericConstant(String),
    StringConstant(String),
    Boolean(bool),
    Null,

    /// `@k` exactly as written (1-based)
    Placeholder(u64),
    IndexedVar(IndexedVar),

    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// `expr::T` or `CAST(expr AS T)`
    Cast {
        expression: Box<Expression>,
        data_type: DataType,
    },
    /// `expr:::T`
    Annotation {
        expression: Box<Expression>,
        data_type: DataType,
    },

    Array(Vec<Expression>),
    Function {
        name: String,
        args: Vec<Expression>,
    },
    Case {
        operand: Option<Box<Expression>>,
        when_clauses: Vec<WhenClause>,
        else_clause: Option<Box<Expression>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub condition: Expression,
    pub result: Expression,
}

impl Expression {
    /// Whether this node is an untyped constant that takes its type from context
    pub fn is_untyped_constant(&self) -> bool {
        matches!(
            self,
            Expression::NumericConstant(_) | Expression::StringConstant(_) | Expression::Null
        )
    }

    /// Number of nodes on the longest path from this node to a leaf
    pub fn height(&self) -> usize {
        let below = match self {
            Expression::NumericConstant(_)
            | Expression::StringConstant(_)
            | Expression::Boolean(_)
            | Expression::Null
            | Expression::Placeholder(_)
            | Expression::IndexedVar(_) => 0,
            Expression::BinaryOp { left, right, .. } => left.height().max(right.height()),
            Expression::UnaryOp { operand, .. } => operand.height(),
            Expression::Cast { expression, .. } | Expression::Annotation { expression, .. } => {
                expression.height()
            }
            Expression::Array(elements) | Expression::Function { args: elements, .. } => {
                elements.iter().map(|e| e.height()).max().unwrap_or(0)
            }
            Expression::Case {
                operand,
                when_clauses,
                else_clause,
            } => operand
                .iter()
                .chain(else_clause.iter())
                .map(|e| e.height())
                .chain(
                    when_clauses
                        .iter()
                        .map(|w| w.condition.height().max(w.result.height())),
                )
                .max()
                .unwrap_or(0),
        };
        below + 1
    }
}
