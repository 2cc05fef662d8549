//! Type resolution for bound expressions.
//!
//! Turns a raw tree (placeholders already bound) into a typed
//! [`Expression`]. Untyped constants take their type from context: the other
//! operand of a binary operator, the declared type of an annotation, or the
//! common type of an array or CASE. Implicit coercions are made explicit as
//! `Cast` nodes so the evaluator never has to guess.

use crate::access::{DataType, Value};
use crate::expression::eval::cast_value;
use crate::expression::{
    BinaryOperator, BuiltinFunction, Expression, ExpressionError, ExpressionResult, Literal,
    SemaContext, UnaryOperator,
};
use crate::sql::{self, WhenClause};

/// Type resolver for raw expressions
pub struct TypeResolver<'a> {
    sema: &'a SemaContext,
}

impl<'a> TypeResolver<'a> {
    pub fn new(sema: &'a SemaContext) -> Self {
        Self { sema }
    }

    /// Resolve the types of every node in `expr`
    pub fn resolve(&self, expr: &sql::Expression) -> ExpressionResult<Expression> {
        self.resolve_with_hint(expr, None)
    }

    /// Resolve `expr`, preferring `hint` for untyped constants
    ///
    /// The hint is soft: a constant that does not fit it falls back to its
    /// natural type and the caller reports any mismatch.
    fn resolve_with_hint(
        &self,
        expr: &sql::Expression,
        hint: Option<&DataType>,
    ) -> ExpressionResult<Expression> {
        match expr {
            sql::Expression::NumericConstant(text) => numeric_constant(text, hint, false),
            sql::Expression::StringConstant(s) => string_constant(s, hint, false),
            sql::Expression::Boolean(b) => Ok(Expression::Literal(Literal::bool(*b))),
            sql::Expression::Null => Ok(Expression::Literal(Literal::typed_null(
                hint.cloned().unwrap_or(DataType::Unknown),
            ))),

            sql::Expression::Placeholder(ordinal) => {
                Err(ExpressionError::UnboundPlaceholder { ordinal: *ordinal })
            }
            sql::Expression::IndexedVar(var) => Ok(Expression::Variable(var.clone())),

            sql::Expression::BinaryOp { left, op, right } => self.resolve_binary(*op, left, right),
            sql::Expression::UnaryOp { op, operand } => self.resolve_unary(*op, operand),

            sql::Expression::Cast {
                expression,
                data_type,
            } => self.resolve_cast(expression, data_type),
            sql::Expression::Annotation {
                expression,
                data_type,
            } => self.resolve_annotation(expression, data_type),

            sql::Expression::Array(elements) => self.resolve_array(elements, hint),
            sql::Expression::Function { name, args } => self.resolve_function(name, args),
            sql::Expression::Case {
                operand,
                when_clauses,
                else_clause,
            } => self.resolve_case(operand.as_deref(), when_clauses, else_clause.as_deref(), hint),
        }
    }

    fn resolve_binary(
        &self,
        op: BinaryOperator,
        left: &sql::Expression,
        right: &sql::Expression,
    ) -> ExpressionResult<Expression> {
        let logical_hint = DataType::Boolean;
        let fixed_hint = op.is_logical().then_some(&logical_hint);

        // Resolve the side that has a type of its own first so a constant on
        // the other side can adopt it
        let (left, right) = if left.is_untyped_constant() && !right.is_untyped_constant() {
            let right = self.resolve_with_hint(right, fixed_hint)?;
            let right_type = right.data_type();
            let left = self.resolve_with_hint(left, fixed_hint.or(known(&right_type)))?;
            (left, right)
        } else {
            let left = self.resolve_with_hint(left, fixed_hint)?;
            let left_type = left.data_type();
            let right = self.resolve_with_hint(right, fixed_hint.or(known(&left_type)))?;
            (left, right)
        };

        let (left, right) = unify_operands(op, left, right);
        let (left_type, right_type) = (left.data_type(), right.data_type());

        let data_type = if left_type.is_unknown() && right_type.is_unknown() {
            if op.is_comparison() || op.is_logical() {
                DataType::Boolean
            } else {
                DataType::Unknown
            }
        } else {
            op.output_type(&left_type, &right_type).ok_or_else(|| {
                ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: left_type.clone(),
                    right_type: Some(right_type.clone()),
                }
            })?
        };

        Ok(Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            data_type,
        })
    }

    fn resolve_unary(
        &self,
        op: UnaryOperator,
        operand: &sql::Expression,
    ) -> ExpressionResult<Expression> {
        let operand = match op {
            UnaryOperator::Not => {
                let operand = self.resolve_with_hint(operand, Some(&DataType::Boolean))?;
                if operand.data_type().is_unknown() {
                    coerce(operand, &DataType::Boolean)
                } else {
                    operand
                }
            }
            _ => self.resolve(operand)?,
        };
        let operand_type = operand.data_type();

        let data_type = match op {
            UnaryOperator::Plus | UnaryOperator::Minus if operand_type.is_unknown() => {
                DataType::Unknown
            }
            _ => op
                .output_type(&operand_type)
                .ok_or_else(|| ExpressionError::InvalidOperandTypes {
                    operator: op.as_str().to_string(),
                    left_type: operand_type.clone(),
                    right_type: None,
                })?,
        };

        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand),
            data_type,
        })
    }

    fn resolve_cast(
        &self,
        expr: &sql::Expression,
        target: &DataType,
    ) -> ExpressionResult<Expression> {
        let operand = self.resolve(expr)?;
        let from = operand.data_type();

        if from == *target {
            return Ok(operand);
        }
        if !from.can_cast_to(target) {
            return Err(ExpressionError::InvalidCast {
                from,
                to: target.clone(),
            });
        }
        Ok(Expression::cast(operand, target.clone()))
    }

    /// `expr:::T` asserts the type instead of converting to it
    fn resolve_annotation(
        &self,
        expr: &sql::Expression,
        target: &DataType,
    ) -> ExpressionResult<Expression> {
        let resolved = match expr {
            sql::Expression::NumericConstant(text) => numeric_constant(text, Some(target), true)?,
            sql::Expression::StringConstant(s) => string_constant(s, Some(target), true)?,
            sql::Expression::Null => Expression::Literal(Literal::typed_null(target.clone())),
            other => self.resolve_with_hint(other, Some(target))?,
        };

        let actual = resolved.data_type();
        if actual == *target {
            Ok(resolved)
        } else if actual.is_unknown() {
            Ok(coerce(resolved, target))
        } else {
            Err(ExpressionError::TypeMismatch {
                expected: target.clone(),
                actual,
                context: "type annotation".to_string(),
            })
        }
    }

    fn resolve_array(
        &self,
        elements: &[sql::Expression],
        hint: Option<&DataType>,
    ) -> ExpressionResult<Expression> {
        let element_hint = hint.and_then(DataType::element_type);
        let (elements, element_type) = self.resolve_homogeneous(elements, element_hint, "ARRAY")?;
        Ok(Expression::Array {
            elements,
            element_type,
        })
    }

    fn resolve_function(
        &self,
        name: &str,
        args: &[sql::Expression],
    ) -> ExpressionResult<Expression> {
        if !self.sema.allow_functions {
            return Err(ExpressionError::FunctionNotAllowed {
                name: name.to_string(),
            });
        }

        let function =
            BuiltinFunction::from_name(name).ok_or_else(|| ExpressionError::UnknownFunction {
                name: name.to_string(),
            })?;

        let args = args
            .iter()
            .map(|arg| self.resolve(arg))
            .collect::<ExpressionResult<Vec<_>>>()?;
        let arg_types: Vec<DataType> = args.iter().map(Expression::data_type).collect();

        let signature =
            function
                .resolve(&arg_types)
                .ok_or_else(|| ExpressionError::UnknownSignature {
                    signature: format!(
                        "{}({})",
                        function.name(),
                        arg_types
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })?;

        let args = args
            .into_iter()
            .zip(&signature.params)
            .map(|(arg, param)| coerce(arg, param))
            .collect();

        Ok(Expression::FunctionCall {
            function,
            args,
            data_type: signature.return_type,
        })
    }

    fn resolve_case(
        &self,
        operand: Option<&sql::Expression>,
        when_clauses: &[WhenClause],
        else_clause: Option<&sql::Expression>,
        hint: Option<&DataType>,
    ) -> ExpressionResult<Expression> {
        // CASE x WHEN v THEN ... is CASE WHEN x = v THEN ...
        let conditions = when_clauses
            .iter()
            .map(|clause| {
                let condition = match operand {
                    Some(operand) => sql::Expression::BinaryOp {
                        left: Box::new(operand.clone()),
                        op: BinaryOperator::Eq,
                        right: Box::new(clause.condition.clone()),
                    },
                    None => clause.condition.clone(),
                };
                let condition = self.resolve_with_hint(&condition, Some(&DataType::Boolean))?;
                match condition.data_type() {
                    DataType::Boolean => Ok(condition),
                    DataType::Unknown => Ok(coerce(condition, &DataType::Boolean)),
                    actual => Err(ExpressionError::TypeMismatch {
                        expected: DataType::Boolean,
                        actual,
                        context: "CASE condition".to_string(),
                    }),
                }
            })
            .collect::<ExpressionResult<Vec<_>>>()?;

        let mut results: Vec<sql::Expression> =
            when_clauses.iter().map(|clause| clause.result.clone()).collect();
        if let Some(else_clause) = else_clause {
            results.push(else_clause.clone());
        }

        let (mut results, data_type) = match self.resolve_homogeneous(&results, hint, "CASE") {
            Ok(resolved) => resolved,
            // Every branch is NULL: the CASE is an untyped NULL
            Err(ExpressionError::IndeterminateType { .. }) => {
                let results = results
                    .iter()
                    .map(|r| self.resolve(r))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                (results, DataType::Unknown)
            }
            Err(e) => return Err(e),
        };

        let else_result = else_clause.and_then(|_| results.pop()).map(Box::new);
        Ok(Expression::Case {
            conditions: conditions.into_iter().zip(results).collect(),
            else_result,
            data_type,
        })
    }

    /// Resolve expressions that must share one type
    ///
    /// Typed expressions are resolved first and decide the common type; untyped
    /// constants then adopt it. INT and FLOAT8 unify to FLOAT8.
    fn resolve_homogeneous(
        &self,
        exprs: &[sql::Expression],
        hint: Option<&DataType>,
        context: &str,
    ) -> ExpressionResult<(Vec<Expression>, DataType)> {
        let mut resolved: Vec<Option<Expression>> = vec![None; exprs.len()];

        for (slot, expr) in resolved.iter_mut().zip(exprs) {
            if !expr.is_untyped_constant() {
                *slot = Some(self.resolve_with_hint(expr, hint)?);
            }
        }

        let typed: Vec<DataType> = resolved.iter().flatten().map(Expression::data_type).collect();
        let constant_hint = match hint {
            Some(h) => Some(h.clone()),
            None => common_type(&typed, context)?,
        };

        for (slot, expr) in resolved.iter_mut().zip(exprs) {
            if slot.is_none() {
                *slot = Some(self.resolve_with_hint(expr, constant_hint.as_ref())?);
            }
        }

        let resolved: Vec<Expression> = resolved.into_iter().flatten().collect();
        let types: Vec<DataType> = resolved.iter().map(Expression::data_type).collect();
        let data_type = match common_type(&types, context)? {
            Some(t) => match hint {
                Some(h) if can_coerce(&t, h) => h.clone(),
                _ => t,
            },
            None => hint.cloned().ok_or_else(|| ExpressionError::IndeterminateType {
                context: context.to_string(),
            })?,
        };

        let resolved = resolved
            .into_iter()
            .map(|e| {
                let actual = e.data_type();
                if actual == data_type || actual.is_unknown() || can_coerce(&actual, &data_type) {
                    Ok(coerce(e, &data_type))
                } else {
                    Err(ExpressionError::TypeMismatch {
                        expected: data_type.clone(),
                        actual,
                        context: context.to_string(),
                    })
                }
            })
            .collect::<ExpressionResult<Vec<_>>>()?;

        Ok((resolved, data_type))
    }
}

fn known(data_type: &DataType) -> Option<&DataType> {
    (!data_type.is_unknown()).then_some(data_type)
}

/// Implicit conversions the resolver inserts on its own
fn can_coerce(from: &DataType, to: &DataType) -> bool {
    match (from, to) {
        (DataType::Unknown, _) => true,
        (DataType::Int, DataType::Float) => true,
        (DataType::Array(f), DataType::Array(t)) => can_coerce(f, t),
        _ => from == to,
    }
}

/// Common type of `types`, ignoring unknowns
fn common_type(types: &[DataType], context: &str) -> ExpressionResult<Option<DataType>> {
    let mut common: Option<DataType> = None;
    for t in types.iter().filter(|t| !t.is_unknown()) {
        common = Some(match common {
            None => t.clone(),
            Some(c) if c == *t || can_coerce(t, &c) => c,
            Some(c) if can_coerce(&c, t) => t.clone(),
            Some(c) => {
                return Err(ExpressionError::TypeMismatch {
                    expected: c,
                    actual: t.clone(),
                    context: context.to_string(),
                })
            }
        });
    }
    Ok(common)
}

/// Make `expr` produce `target`, adding a cast where the types differ
fn coerce(expr: Expression, target: &DataType) -> Expression {
    if expr.data_type() == *target {
        return expr;
    }
    match expr {
        Expression::Literal(Literal {
            value: Value::Null,
            ..
        }) => Expression::Literal(Literal::typed_null(target.clone())),
        other => Expression::cast(other, target.clone()),
    }
}

/// Give both operands of `op` a common type where an implicit conversion exists
fn unify_operands(op: BinaryOperator, left: Expression, right: Expression) -> (Expression, Expression) {
    let (left_type, right_type) = (left.data_type(), right.data_type());

    match (&left_type, &right_type) {
        (DataType::Unknown, DataType::Unknown) if op.is_logical() => (
            coerce(left, &DataType::Boolean),
            coerce(right, &DataType::Boolean),
        ),
        (DataType::Unknown, DataType::Unknown) => (left, right),
        (DataType::Unknown, t) => (coerce(left, t), right),
        (t, DataType::Unknown) => {
            let right = coerce(right, t);
            (left, right)
        }
        (DataType::Int, DataType::Float) if op.is_arithmetic() || op.is_comparison() => {
            (coerce(left, &DataType::Float), right)
        }
        (DataType::Float, DataType::Int) if op.is_arithmetic() || op.is_comparison() => {
            (left, coerce(right, &DataType::Float))
        }
        _ => (left, right),
    }
}

/// Type a numeric constant
///
/// Without a hint, integral text becomes INT8 and anything else FLOAT8. With
/// `strict` set (an annotation), the constant must become exactly `target`.
fn numeric_constant(
    text: &str,
    target: Option<&DataType>,
    strict: bool,
) -> ExpressionResult<Expression> {
    let invalid = |data_type: &DataType, reason: &str| ExpressionError::InvalidConstant {
        constant: text.to_string(),
        data_type: data_type.clone(),
        reason: reason.to_string(),
    };

    match target {
        Some(DataType::Float) => {
            let x = text
                .parse::<f64>()
                .map_err(|e| invalid(&DataType::Float, &e.to_string()))?;
            return Ok(Expression::Literal(Literal::float(x)));
        }
        Some(DataType::Int) => match text.parse::<i64>() {
            Ok(n) => return Ok(Expression::Literal(Literal::int(n))),
            Err(_) if strict => {
                let reason = if text.parse::<f64>().map_or(false, |x| x.fract() == 0.0) {
                    "value out of range"
                } else {
                    "value is not an integer"
                };
                return Err(invalid(&DataType::Int, reason));
            }
            Err(_) => {}
        },
        Some(other) if strict => {
            return Err(ExpressionError::TypeMismatch {
                expected: other.clone(),
                actual: natural_numeric_type(text),
                context: "type annotation".to_string(),
            })
        }
        _ => {}
    }

    if let Ok(n) = text.parse::<i64>() {
        Ok(Expression::Literal(Literal::int(n)))
    } else {
        text.parse::<f64>()
            .map(|x| Expression::Literal(Literal::float(x)))
            .map_err(|e| invalid(&DataType::Float, &e.to_string()))
    }
}

fn natural_numeric_type(text: &str) -> DataType {
    if text.parse::<i64>().is_ok() {
        DataType::Int
    } else {
        DataType::Float
    }
}

/// Type a string constant
///
/// A string constant placed where a scalar INT8, FLOAT8 or BOOL is expected is
/// parsed as that type, so `@1 = '5'` compares integers.
fn string_constant(
    s: &str,
    target: Option<&DataType>,
    strict: bool,
) -> ExpressionResult<Expression> {
    match target {
        Some(t @ (DataType::Int | DataType::Float | DataType::Boolean)) => {
            let value = cast_value(Value::String(s.to_string()), t).map_err(|e| {
                ExpressionError::InvalidConstant {
                    constant: Value::String(s.to_string()).to_string(),
                    data_type: t.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Expression::Literal(Literal::new(value)))
        }
        Some(t @ DataType::Array(_)) if strict => Err(ExpressionError::TypeMismatch {
            expected: t.clone(),
            actual: DataType::String,
            context: "type annotation".to_string(),
        }),
        _ => Ok(Expression::Literal(Literal::string(s))),
    }
}

/// Helper function to resolve types of a bound expression
pub fn resolve_types(expr: &sql::Expression, sema: &SemaContext) -> ExpressionResult<Expression> {
    TypeResolver::new(sema).resolve(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{RowShape, VarBindingContext};
    use crate::expression::bind_ordinals;
    use crate::sql::parse_expression;

    fn resolve_with(text: &str, types: Vec<DataType>) -> ExpressionResult<Expression> {
        let mut ctx = VarBindingContext::for_row_shape(RowShape::new(types));
        let bound = bind_ordinals(parse_expression(text).unwrap(), &mut ctx)?;
        resolve_types(&bound, &SemaContext::default())
    }

    fn resolve(text: &str) -> ExpressionResult<Expression> {
        resolve_with(text, vec![DataType::Int; 4])
    }

    #[test]
    fn test_arithmetic_types() {
        let expr = resolve("@1 * (@2 + @3) + @1").unwrap();
        assert_eq!(expr.data_type(), DataType::Int);
        assert_eq!(expr.to_string(), "(var0 * (var1 + var2)) + var0");

        let expr = resolve("@1 + 1").unwrap();
        assert_eq!(expr.data_type(), DataType::Int);
        assert_eq!(expr.to_string(), "var0 + 1");
    }

    #[test]
    fn test_constant_adopts_operand_type() {
        let types = vec![DataType::Float];
        let expr = resolve_with("@1 + 1", types.clone()).unwrap();
        assert_eq!(expr.data_type(), DataType::Float);
        assert_eq!(expr.to_string(), "var0 + 1.0");

        // Constant on the left still sees the variable's type
        let expr = resolve_with("2 * @1", types).unwrap();
        assert_eq!(expr.to_string(), "2.0 * var0");
    }

    #[test]
    fn test_int_float_mix_inserts_cast() {
        let expr = resolve("@1 + 1.5").unwrap();
        assert_eq!(expr.data_type(), DataType::Float);
        assert_eq!(expr.to_string(), "var0::FLOAT8 + 1.5");
    }

    #[test]
    fn test_string_constant_parsed_for_comparison() {
        let expr = resolve("@1 = '5'").unwrap();
        assert_eq!(expr.data_type(), DataType::Boolean);
        assert_eq!(expr.to_string(), "var0 = 5");

        assert!(matches!(
            resolve("@1 = 'abc'"),
            Err(ExpressionError::InvalidConstant { .. })
        ));
    }

    #[test]
    fn test_invalid_operands() {
        let err = resolve_with("@1 + @2", vec![DataType::Int, DataType::String]).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidOperandTypes {
                operator: "+".to_string(),
                left_type: DataType::Int,
                right_type: Some(DataType::String),
            }
        );

        assert!(matches!(
            resolve("NOT @1"),
            Err(ExpressionError::InvalidOperandTypes { right_type: None, .. })
        ));

        // Only arithmetic and comparison widen INT8 to FLOAT8
        let err = resolve_with("@1 || @2", vec![DataType::Int, DataType::Float]).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidOperandTypes {
                operator: "||".to_string(),
                left_type: DataType::Int,
                right_type: Some(DataType::Float),
            }
        );
    }

    #[test]
    fn test_null_handling() {
        let expr = resolve("@1 + NULL").unwrap();
        assert_eq!(expr.data_type(), DataType::Int);

        let expr = resolve("NULL = NULL").unwrap();
        assert_eq!(expr.data_type(), DataType::Boolean);

        let expr = resolve("NULL AND true").unwrap();
        assert_eq!(expr.data_type(), DataType::Boolean);

        let expr = resolve("NULL").unwrap();
        assert_eq!(expr.data_type(), DataType::Unknown);

        let expr = resolve("NULL:::INT").unwrap();
        assert_eq!(
            expr,
            Expression::Literal(Literal::typed_null(DataType::Int))
        );
    }

    #[test]
    fn test_annotations() {
        let expr = resolve("1:::FLOAT").unwrap();
        assert_eq!(expr, Expression::Literal(Literal::float(1.0)));

        let expr = resolve("'12':::INT").unwrap();
        assert_eq!(expr, Expression::Literal(Literal::int(12)));

        assert!(matches!(
            resolve("1.5:::INT"),
            Err(ExpressionError::InvalidConstant { .. })
        ));
        assert!(matches!(
            resolve("'x':::INT"),
            Err(ExpressionError::InvalidConstant { .. })
        ));
        assert!(matches!(
            resolve("1:::STRING"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            resolve("@1:::STRING"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_casts() {
        let expr = resolve("@1::FLOAT").unwrap();
        assert_eq!(expr.data_type(), DataType::Float);
        assert_eq!(expr.to_string(), "var0::FLOAT8");

        // Casting to the same type is a no-op
        let expr = resolve("@1::INT").unwrap();
        assert_eq!(expr.to_string(), "var0");

        let err = resolve("ARRAY[@1]::INT").unwrap_err();
        assert!(matches!(err, ExpressionError::InvalidCast { .. }));
    }

    #[test]
    fn test_arrays() {
        let expr = resolve("ARRAY[1:::INT,2:::INT]").unwrap();
        assert_eq!(expr.data_type(), DataType::array_of(DataType::Int));

        let expr = resolve("ARRAY[@1, 2.5]").unwrap();
        assert_eq!(expr.data_type(), DataType::array_of(DataType::Float));
        assert_eq!(expr.to_string(), "ARRAY[var0::FLOAT8,2.5]");

        let expr = resolve("ARRAY[1, 2]:::FLOAT[]").unwrap();
        match expr {
            Expression::Array { elements, .. } => {
                assert_eq!(elements[0], Expression::Literal(Literal::float(1.0)));
            }
            other => panic!("Expected array, got {:?}", other),
        }

        assert!(matches!(
            resolve("ARRAY[]"),
            Err(ExpressionError::IndeterminateType { .. })
        ));
        assert!(matches!(
            resolve("ARRAY[NULL, NULL]"),
            Err(ExpressionError::IndeterminateType { .. })
        ));
        let expr = resolve("ARRAY[]:::STRING[]").unwrap();
        assert_eq!(expr.data_type(), DataType::array_of(DataType::String));

        assert!(matches!(
            resolve("ARRAY[1, true]"),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_case() {
        let expr = resolve("CASE WHEN @1 > 0 THEN 'pos' ELSE 'neg' END").unwrap();
        assert_eq!(expr.data_type(), DataType::String);
        assert_eq!(expr.to_string(), "CASE WHEN var0 > 0 THEN 'pos' ELSE 'neg' END");

        let expr = resolve("CASE @1 WHEN 1 THEN 1.5 WHEN 2 THEN @2 END").unwrap();
        assert_eq!(expr.data_type(), DataType::Float);
        assert_eq!(
            expr.to_string(),
            "CASE WHEN var0 = 1 THEN 1.5 WHEN var0 = 2 THEN var1::FLOAT8 END"
        );

        let err = resolve("CASE WHEN @1 THEN 1 END").unwrap_err();
        assert_eq!(
            err,
            ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: DataType::Int,
                context: "CASE condition".to_string(),
            }
        );
    }

    #[test]
    fn test_functions() {
        let expr = resolve("abs(@1)").unwrap();
        assert_eq!(expr.data_type(), DataType::Int);

        let expr = resolve("sqrt(@1)").unwrap();
        assert_eq!(expr.data_type(), DataType::Float);
        assert_eq!(expr.to_string(), "sqrt(var0::FLOAT8)");

        assert!(matches!(
            resolve("no_such_fn(@1)"),
            Err(ExpressionError::UnknownFunction { .. })
        ));
        assert_eq!(
            resolve("length(@1)"),
            Err(ExpressionError::UnknownSignature {
                signature: "length(INT8)".to_string()
            })
        );

        let mut ctx = VarBindingContext::for_row_shape(RowShape::new(vec![DataType::Int]));
        let bound = bind_ordinals(parse_expression("abs(@1)").unwrap(), &mut ctx).unwrap();
        assert_eq!(
            resolve_types(&bound, &SemaContext::without_functions()),
            Err(ExpressionError::FunctionNotAllowed {
                name: "abs".to_string()
            })
        );
    }

    #[test]
    fn test_unbound_placeholder() {
        let raw = parse_expression("@1 + 1").unwrap();
        assert_eq!(
            resolve_types(&raw, &SemaContext::default()),
            Err(ExpressionError::UnboundPlaceholder { ordinal: 1 })
        );
    }
}
