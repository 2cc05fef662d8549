//! Value model shared by the parser, the type resolver and the evaluator.
//!
//! - **DataType**: the types a scalar expression can produce
//! - **Value**: runtime datums, including typed arrays
//!
//! Constant folding and row-at-a-time evaluation both produce `Value`s, so
//! there is exactly one representation of a computed result.

pub mod value;

pub use value::{ArrayValue, DataType, Value};
