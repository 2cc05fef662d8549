//! Builtin scalar functions.

use crate::access::{DataType, Value};
use crate::expression::{ExpressionError, ExpressionResult};

/// Resolved overload of a builtin
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<DataType>,
    pub return_type: DataType,
}

impl Signature {
    fn new(params: Vec<DataType>, return_type: DataType) -> Self {
        Self {
            params,
            return_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Abs,
    Sqrt,
    Length,
    Lower,
    Upper,
}

impl BuiltinFunction {
    /// Look up a builtin by its (lowercase) name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "abs" => Some(BuiltinFunction::Abs),
            "sqrt" => Some(BuiltinFunction::Sqrt),
            "length" | "char_length" => Some(BuiltinFunction::Length),
            "lower" => Some(BuiltinFunction::Lower),
            "upper" => Some(BuiltinFunction::Upper),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Abs => "abs",
            BuiltinFunction::Sqrt => "sqrt",
            BuiltinFunction::Length => "length",
            BuiltinFunction::Lower => "lower",
            BuiltinFunction::Upper => "upper",
        }
    }

    fn overloads(&self) -> Vec<Signature> {
        match self {
            BuiltinFunction::Abs => vec![
                Signature::new(vec![DataType::Int], DataType::Int),
                Signature::new(vec![DataType::Float], DataType::Float),
            ],
            BuiltinFunction::Sqrt => vec![Signature::new(vec![DataType::Float], DataType::Float)],
            BuiltinFunction::Length => vec![Signature::new(vec![DataType::String], DataType::Int)],
            BuiltinFunction::Lower | BuiltinFunction::Upper => {
                vec![Signature::new(vec![DataType::String], DataType::String)]
            }
        }
    }

    /// Pick the overload for the given argument types
    ///
    /// An exact match wins; otherwise the first overload reachable through the
    /// implicit INT -> FLOAT coercion is used. NULL arguments match anything.
    pub fn resolve(&self, arg_types: &[DataType]) -> Option<Signature> {
        let overloads = self.overloads();
        let arity_ok = |sig: &&Signature| sig.params.len() == arg_types.len();

        let exact = overloads.iter().filter(arity_ok).find(|sig| {
            sig.params
                .iter()
                .zip(arg_types)
                .all(|(param, arg)| arg.is_unknown() || param == arg)
        });
        if let Some(sig) = exact {
            return Some(sig.clone());
        }

        overloads
            .iter()
            .filter(arity_ok)
            .find(|sig| {
                sig.params.iter().zip(arg_types).all(|(param, arg)| {
                    arg.is_unknown()
                        || param == arg
                        || (*arg == DataType::Int && *param == DataType::Float)
                })
            })
            .cloned()
    }

    /// Call the builtin on already-evaluated arguments
    ///
    /// All builtins are strict: a NULL argument yields NULL.
    pub fn call(&self, args: &[Value]) -> ExpressionResult<Value> {
        if args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }

        match (self, args) {
            (BuiltinFunction::Abs, [Value::Int(n)]) => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| ExpressionError::IntegerOverflow {
                    operator: "abs()".to_string(),
                }),
            (BuiltinFunction::Abs, [Value::Float(x)]) => Ok(Value::Float(x.abs())),
            (BuiltinFunction::Sqrt, [Value::Float(x)]) => {
                if *x < 0.0 {
                    Err(ExpressionError::OutOfDomain {
                        message: "cannot take square root of a negative number".to_string(),
                    })
                } else {
                    Ok(Value::Float(x.sqrt()))
                }
            }
            (BuiltinFunction::Length, [Value::String(s)]) => Ok(Value::Int(s.chars().count() as i64)),
            (BuiltinFunction::Lower, [Value::String(s)]) => Ok(Value::String(s.to_lowercase())),
            (BuiltinFunction::Upper, [Value::String(s)]) => Ok(Value::String(s.to_uppercase())),
            _ => Err(ExpressionError::UnknownSignature {
                signature: format!(
                    "{}({})",
                    self.name(),
                    args.iter()
                        .map(|arg| arg.data_type().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }
}
