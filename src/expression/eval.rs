//! Expression evaluation implementation.
//!
//! This is the only implementation of value semantics in the crate: the
//! constant folder evaluates constant subtrees through the same evaluator that
//! later runs the prepared expression against rows.

use crate::access::{ArrayValue, DataType, Value};
use crate::expression::{
    BinaryOperator, EvalContext, Expression, ExpressionError, ExpressionResult, IndexedVar,
    UnaryOperator,
};
use std::cmp::Ordering;

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    /// The row values to evaluate against
    row: &'a [Value],
    ctx: &'a EvalContext,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator over one row
    pub fn new(row: &'a [Value], ctx: &'a EvalContext) -> Self {
        Self { row, ctx }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.clone()),

            Expression::Variable(var) => self.evaluate_variable(var),

            Expression::BinaryOp {
                op, left, right, ..
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand, .. } => {
                let operand_val = self.evaluate(operand)?;
                evaluate_unary_op(*op, operand_val)
            }

            Expression::Cast { operand, data_type } => {
                let value = self.evaluate(operand)?;
                cast_value(value, data_type)
            }

            Expression::Array {
                elements,
                element_type,
            } => {
                let values = elements
                    .iter()
                    .map(|e| self.evaluate(e))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue::new(element_type.clone(), values)))
            }

            Expression::FunctionCall { function, args, .. } => {
                self.ctx.check_cancelled()?;
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                function.call(&values)
            }

            Expression::Case {
                conditions,
                else_result,
                ..
            } => {
                for (condition, result) in conditions {
                    if self.evaluate(condition)? == Value::Boolean(true) {
                        return self.evaluate(result);
                    }
                }
                match else_result {
                    Some(e) => self.evaluate(e),
                    None => Ok(Value::Null),
                }
            }
        }
    }

    /// Evaluate a variable reference
    fn evaluate_variable(&self, var: &IndexedVar) -> ExpressionResult<Value> {
        self.row
            .get(var.index)
            .cloned()
            .ok_or(ExpressionError::ColumnIndexOutOfBounds {
                index: var.index,
                row_len: self.row.len(),
            })
    }
}

fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left_type: left.data_type(),
        right_type: Some(right.data_type()),
    }
}

fn overflow(op: BinaryOperator) -> ExpressionError {
    ExpressionError::IntegerOverflow {
        operator: op.as_str().to_string(),
    }
}

/// Evaluate a binary operation on two values
pub fn evaluate_binary_op(
    op: BinaryOperator,
    left: Value,
    right: Value,
) -> ExpressionResult<Value> {
    // Handle NULL propagation for most operators
    if left.is_null() || right.is_null() {
        return Ok(match op {
            // NULL AND false = false, NULL AND true = NULL
            BinaryOperator::And => match (&left, &right) {
                (Value::Boolean(false), _) | (_, Value::Boolean(false)) => Value::Boolean(false),
                _ => Value::Null,
            },
            // NULL OR true = true, NULL OR false = NULL
            BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                _ => Value::Null,
            },
            _ => Value::Null,
        });
    }

    match op {
        BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => {
            match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => {
                    let result = match op {
                        BinaryOperator::Add => a.checked_add(*b),
                        BinaryOperator::Sub => a.checked_sub(*b),
                        _ => a.checked_mul(*b),
                    };
                    result.map(Value::Int).ok_or_else(|| overflow(op))
                }
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
                    BinaryOperator::Add => a + b,
                    BinaryOperator::Sub => a - b,
                    _ => a * b,
                })),
                _ => Err(invalid_operands(op, &left, &right)),
            }
        }

        BinaryOperator::Div => match (&left, &right) {
            (Value::Int(_), Value::Int(0)) => Err(ExpressionError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => {
                a.checked_div(*b).map(Value::Int).ok_or_else(|| overflow(op))
            }
            (Value::Float(_), Value::Float(b)) if *b == 0.0 => Err(ExpressionError::DivisionByZero),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Mod => match (&left, &right) {
            (Value::Int(_), Value::Int(0)) => Err(ExpressionError::DivisionByZero),
            // i64::MIN % -1 is mathematically 0
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
            (Value::Float(_), Value::Float(b)) if *b == 0.0 => Err(ExpressionError::DivisionByZero),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a % b)),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        // Comparison operators
        BinaryOperator::Eq => compare_values(op, &left, &right, |ord| ord == Ordering::Equal),
        BinaryOperator::Ne => compare_values(op, &left, &right, |ord| ord != Ordering::Equal),
        BinaryOperator::Lt => compare_values(op, &left, &right, |ord| ord == Ordering::Less),
        BinaryOperator::Le => compare_values(op, &left, &right, |ord| ord != Ordering::Greater),
        BinaryOperator::Gt => compare_values(op, &left, &right, |ord| ord == Ordering::Greater),
        BinaryOperator::Ge => compare_values(op, &left, &right, |ord| ord != Ordering::Less),

        // Logical operators
        BinaryOperator::And | BinaryOperator::Or => match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(if op == BinaryOperator::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Concat => match (&left, &right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(invalid_operands(op, &left, &right)),
        },
    }
}

/// Evaluate a unary operation on a value
pub fn evaluate_unary_op(op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
    let invalid = |operand: &Value| ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left_type: operand.data_type(),
        right_type: None,
    };

    match op {
        UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),
        UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

        UnaryOperator::Not => match operand {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(invalid(&other)),
        },

        UnaryOperator::Plus => match operand {
            Value::Null | Value::Int(_) | Value::Float(_) => Ok(operand),
            other => Err(invalid(&other)),
        },

        UnaryOperator::Minus => match operand {
            Value::Null => Ok(Value::Null),
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                ExpressionError::IntegerOverflow {
                    operator: "unary -".to_string(),
                }
            }),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(invalid(&other)),
        },
    }
}

/// Compare two non-NULL values of the same type and apply a comparison function
fn compare_values<F>(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    cmp_fn: F,
) -> ExpressionResult<Value>
where
    F: FnOnce(Ordering) -> bool,
{
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        // NaN sorts after every other float and equals itself
        (Value::Float(a), Value::Float(b)) => a
            .partial_cmp(b)
            .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        _ => return Err(invalid_operands(op, left, right)),
    };

    Ok(Value::Boolean(cmp_fn(ordering)))
}

fn cast_failed(value: &Value, data_type: &DataType) -> ExpressionError {
    ExpressionError::CastFailed {
        value: value.to_string(),
        data_type: data_type.clone(),
    }
}

fn float_to_string(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x == f64::INFINITY {
        "Infinity".to_string()
    } else if x == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        x.to_string()
    }
}

/// Convert a value to `target`
///
/// NULL casts to NULL of any type. Conversions that lose the value entirely
/// (unparseable strings, out-of-range floats) fail.
pub fn cast_value(value: Value, target: &DataType) -> ExpressionResult<Value> {
    if value.is_null() || value.data_type() == *target {
        return Ok(value);
    }

    match (&value, target) {
        (Value::Int(n), DataType::Float) => Ok(Value::Float(*n as f64)),
        (Value::Int(n), DataType::Boolean) => Ok(Value::Boolean(*n != 0)),
        (Value::Int(n), DataType::String) => Ok(Value::String(n.to_string())),

        (Value::Float(x), DataType::Int) => {
            let rounded = x.round();
            // i64::MAX is not exactly representable; 2^63 is the first float out of range
            if rounded >= -9.223_372_036_854_776e18 && rounded < 9.223_372_036_854_776e18 {
                Ok(Value::Int(rounded as i64))
            } else {
                Err(ExpressionError::IntegerOverflow {
                    operator: "cast".to_string(),
                })
            }
        }
        (Value::Float(x), DataType::String) => Ok(Value::String(float_to_string(*x))),

        (Value::Boolean(b), DataType::Int) => Ok(Value::Int(i64::from(*b))),
        (Value::Boolean(b), DataType::String) => Ok(Value::String(b.to_string())),

        (Value::String(s), DataType::Int) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| cast_failed(&value, target)),
        (Value::String(s), DataType::Float) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| cast_failed(&value, target)),
        (Value::String(s), DataType::Boolean) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Value::Boolean(true)),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(Value::Boolean(false)),
            _ => Err(cast_failed(&value, target)),
        },

        (Value::Array(array), DataType::Array(element_type)) => {
            let elements = array
                .elements
                .iter()
                .cloned()
                .map(|e| cast_value(e, element_type))
                .collect::<ExpressionResult<Vec<_>>>()?;
            Ok(Value::Array(ArrayValue::new((**element_type).clone(), elements)))
        }

        _ => Err(cast_failed(&value, target)),
    }
}

/// Helper function to evaluate an expression against one row
pub fn evaluate_expression(
    expr: &Expression,
    row: &[Value],
    ctx: &EvalContext,
) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(row, ctx).evaluate(expr)
}
