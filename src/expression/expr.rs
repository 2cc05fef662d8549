//! Typed expression tree definitions.

use crate::access::{DataType, Value};
use crate::expression::function::BuiltinFunction;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use std::fmt;

/// Reference to an input column, resolved through a binding context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexedVar {
    /// Slot in the row (0-based)
    pub index: usize,
    /// Display name captured when the ordinal was bound
    pub name: String,
    pub data_type: DataType,
}

impl IndexedVar {
    pub fn new(index: usize, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            index,
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for IndexedVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Literal value in an expression
///
/// Carries its type separately so a typed NULL keeps the type it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub data_type: DataType,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        let data_type = value.data_type();
        Self { value, data_type }
    }

    pub fn typed_null(data_type: DataType) -> Self {
        Self {
            value: Value::Null,
            data_type,
        }
    }

    pub fn bool(val: bool) -> Self {
        Self::new(Value::Boolean(val))
    }

    pub fn int(val: i64) -> Self {
        Self::new(Value::Int(val))
    }

    pub fn float(val: f64) -> Self {
        Self::new(Value::Float(val))
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self::new(Value::String(val.into()))
    }
}

/// Type-resolved expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),

    Variable(IndexedVar),

    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        data_type: DataType,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
        data_type: DataType,
    },

    Cast {
        operand: Box<Expression>,
        data_type: DataType,
    },

    Array {
        elements: Vec<Expression>,
        element_type: DataType,
    },

    FunctionCall {
        function: BuiltinFunction,
        args: Vec<Expression>,
        data_type: DataType,
    },

    Case {
        conditions: Vec<(Expression, Expression)>,
        else_result: Option<Box<Expression>>,
        data_type: DataType,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(Literal::new(value))
    }

    /// Create a variable reference expression
    pub fn variable(index: usize, name: impl Into<String>, data_type: DataType) -> Self {
        Expression::Variable(IndexedVar::new(index, name, data_type))
    }

    /// Create a binary operation, computing its type from the operands
    ///
    /// Returns `None` when the operator does not accept the operand types.
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Option<Self> {
        let data_type = op.output_type(&left.data_type(), &right.data_type())?;
        Some(Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            data_type,
        })
    }

    /// Create a unary operation, computing its type from the operand
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Option<Self> {
        let data_type = op.output_type(&operand.data_type())?;
        Some(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
            data_type,
        })
    }

    /// Create a cast expression
    pub fn cast(operand: Expression, data_type: DataType) -> Self {
        Expression::Cast {
            operand: Box::new(operand),
            data_type,
        }
    }

    /// The resolved type of this node
    pub fn data_type(&self) -> DataType {
        match self {
            Expression::Literal(lit) => lit.data_type.clone(),
            Expression::Variable(var) => var.data_type.clone(),
            Expression::BinaryOp { data_type, .. }
            | Expression::UnaryOp { data_type, .. }
            | Expression::Cast { data_type, .. }
            | Expression::FunctionCall { data_type, .. }
            | Expression::Case { data_type, .. } => data_type.clone(),
            Expression::Array { element_type, .. } => DataType::array_of(element_type.clone()),
        }
    }

    /// Check if this expression is a constant (contains no variable references)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Variable(_) => false,
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::UnaryOp { operand, .. } | Expression::Cast { operand, .. } => {
                operand.is_constant()
            }
            Expression::Array { elements, .. } => elements.iter().all(|e| e.is_constant()),
            Expression::FunctionCall { args, .. } => args.iter().all(|arg| arg.is_constant()),
            Expression::Case {
                conditions,
                else_result,
                ..
            } => {
                conditions
                    .iter()
                    .all(|(cond, res)| cond.is_constant() && res.is_constant())
                    && else_result.as_ref().map_or(true, |e| e.is_constant())
            }
        }
    }

    /// Operator applications get parentheses when nested inside another operator
    fn needs_parens(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. } | Expression::UnaryOp { .. })
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_parens() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(lit) => write!(f, "{}", lit.value),
            Expression::Variable(var) => write!(f, "{}", var),
            Expression::BinaryOp {
                op, left, right, ..
            } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.as_str())?;
                right.fmt_operand(f)
            }
            Expression::UnaryOp { op, operand, .. } => {
                if op.is_postfix() {
                    operand.fmt_operand(f)?;
                    return write!(f, " {}", op.as_str());
                }
                f.write_str(op.as_str())?;
                if *op == UnaryOperator::Not {
                    f.write_str(" ")?;
                }
                operand.fmt_operand(f)
            }
            Expression::Cast { operand, data_type } => {
                operand.fmt_operand(f)?;
                write!(f, "::{}", data_type)
            }
            Expression::Array { elements, .. } => {
                f.write_str("ARRAY[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Expression::FunctionCall { function, args, .. } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expression::Case {
                conditions,
                else_result,
                ..
            } => {
                f.write_str("CASE")?;
                for (cond, res) in conditions {
                    write!(f, " WHEN {} THEN {}", cond, res)?;
                }
                if let Some(e) = else_result {
                    write!(f, " ELSE {}", e)?;
                }
                f.write_str(" END")
            }
        }
    }
}
