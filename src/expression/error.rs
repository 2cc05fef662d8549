//! Error types for expression processing and evaluation.

use crate::access::DataType;
use std::fmt;
use thiserror::Error;

/// The pipeline step an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed expression text
    Parse,
    /// Ordinal placeholder that does not fit the binding context
    Bind,
    /// No valid typing for an operator, cast or function
    Type,
    /// Runtime failure while evaluating (overflow, division by zero, ...)
    Eval,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse error",
            ErrorKind::Bind => "bind error",
            ErrorKind::Type => "type error",
            ErrorKind::Eval => "evaluation error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while processing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Placeholder @{ordinal} is out of range: the row has {capacity} columns")]
    OrdinalOutOfRange { ordinal: u64, capacity: usize },

    #[error("Invalid placeholder @{ordinal}: ordinals start at 1")]
    InvalidOrdinal { ordinal: u64 },

    #[error("Placeholder @{ordinal} was not bound to a column")]
    UnboundPlaceholder { ordinal: u64 },

    #[error("Invalid operand types for operator {operator}: {}", format_operands(.left_type, .right_type))]
    InvalidOperandTypes {
        operator: String,
        left_type: DataType,
        right_type: Option<DataType>,
    },

    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    #[error("Could not determine data type of {context}")]
    IndeterminateType { context: String },

    #[error("Could not parse {constant} as type {data_type}: {reason}")]
    InvalidConstant {
        constant: String,
        data_type: DataType,
        reason: String,
    },

    #[error("Invalid cast from {from} to {to}")]
    InvalidCast { from: DataType, to: DataType },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Unknown signature: {signature}")]
    UnknownSignature { signature: String },

    #[error("Function {name}() is not allowed in this context")]
    FunctionNotAllowed { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer out of range in {operator}")]
    IntegerOverflow { operator: String },

    #[error("Value out of domain: {message}")]
    OutOfDomain { message: String },

    #[error("Could not cast {value} to {data_type}")]
    CastFailed { value: String, data_type: DataType },

    #[error("Column index {index} out of bounds for row with {row_len} columns")]
    ColumnIndexOutOfBounds { index: usize, row_len: usize },

    #[error("Expression evaluation was cancelled")]
    Cancelled,

    #[error("Expression evaluation error: {message}")]
    EvaluationError { message: String },
}

fn format_operands(left: &DataType, right: &Option<DataType>) -> String {
    match right {
        Some(right) => format!("<{}> and <{}>", left, right),
        None => format!("<{}>", left),
    }
}

impl ExpressionError {
    /// Which pipeline step this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpressionError::Parse { .. } => ErrorKind::Parse,

            ExpressionError::OrdinalOutOfRange { .. } | ExpressionError::InvalidOrdinal { .. } => {
                ErrorKind::Bind
            }

            ExpressionError::UnboundPlaceholder { .. }
            | ExpressionError::InvalidOperandTypes { .. }
            | ExpressionError::TypeMismatch { .. }
            | ExpressionError::IndeterminateType { .. }
            | ExpressionError::InvalidConstant { .. }
            | ExpressionError::InvalidCast { .. }
            | ExpressionError::UnknownFunction { .. }
            | ExpressionError::UnknownSignature { .. }
            | ExpressionError::FunctionNotAllowed { .. } => ErrorKind::Type,

            ExpressionError::DivisionByZero
            | ExpressionError::IntegerOverflow { .. }
            | ExpressionError::OutOfDomain { .. }
            | ExpressionError::CastFailed { .. }
            | ExpressionError::ColumnIndexOutOfBounds { .. }
            | ExpressionError::Cancelled
            | ExpressionError::EvaluationError { .. } => ErrorKind::Eval,
        }
    }
}

/// The grammar layer reports through `anyhow`; anything it raises is a parse error.
impl From<anyhow::Error> for ExpressionError {
    fn from(err: anyhow::Error) -> Self {
        ExpressionError::Parse {
            message: format!("{:#}", err),
        }
    }
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
