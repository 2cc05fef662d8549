//! Expression framework: binding, type resolution, folding and evaluation.
//!
//! This module provides:
//! - The typed expression tree and its canonical rendering
//! - Ordinal binding of `@k` placeholders against a shared context
//! - Type resolution with contextual typing of constants
//! - Constant folding and row evaluation over one shared evaluator

pub mod binder;
pub mod context;
pub mod error;
pub mod eval;
pub mod expr;
pub mod fold;
pub mod function;
pub mod operator;
pub mod type_checker;

pub use binder::{bind_ordinals, OrdinalBinder};
pub use context::{CancelFlag, EvalContext, SemaContext};
pub use error::{ErrorKind, ExpressionError, ExpressionResult};
pub use eval::{cast_value, evaluate_expression, ExpressionEvaluator};
pub use expr::{Expression, IndexedVar, Literal};
pub use fold::{fold_constants, ConstantFolder};
pub use function::{BuiltinFunction, Signature};
pub use operator::{BinaryOperator, UnaryOperator};
pub use type_checker::{resolve_types, TypeResolver};
