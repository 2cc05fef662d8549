use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rowexpr::access::{ArrayValue, DataType, Value};
use rowexpr::binding::{RowShape, VarBindingContext};
use rowexpr::expression::{CancelFlag, ErrorKind, EvalContext, ExpressionError, SemaContext};
use rowexpr::flow::{ExpressionSpec, StageExpressions};
use rowexpr::pipeline::{
    bind_ordinals, parse, process_expression, resolve_types, ProcessedExpression,
};
use std::sync::Arc;
use std::thread;

fn int_context(capacity: usize) -> VarBindingContext {
    VarBindingContext::for_row_shape(RowShape::new(vec![DataType::Int; capacity]))
}

fn process(
    text: &str,
    vars: &mut VarBindingContext,
) -> Result<ProcessedExpression, ExpressionError> {
    process_expression(
        &ExpressionSpec::new(text),
        &EvalContext::default(),
        &SemaContext::default(),
        vars,
    )
}

#[test]
fn test_references_accumulate_across_calls() {
    let mut vars = int_context(4);

    let first = process("@1 * (@2 + @3) + @1", &mut vars).unwrap();
    assert!(matches!(first, ProcessedExpression::Tree(_)));
    assert_eq!(first.to_string(), "(var0 * (var1 + var2)) + var0");
    assert!(vars.is_referenced(0));
    assert!(vars.is_referenced(1));
    assert!(vars.is_referenced(2));
    assert!(!vars.is_referenced(3));

    let second = process("@4 - @1", &mut vars).unwrap();
    assert_eq!(second.to_string(), "var3 - var0");
    assert_eq!(vars.referenced_slots(), vec![0, 1, 2, 3]);
}

#[test]
fn test_constant_array_becomes_datum() {
    let mut vars = int_context(4);
    let processed = process("ARRAY[1:::INT,2:::INT]", &mut vars).unwrap();

    match processed.as_datum() {
        Some(Value::Array(array)) => {
            assert_eq!(array.element_type, DataType::Int);
            assert_eq!(array.elements, vec![Value::Int(1), Value::Int(2)]);
            assert!(!array.has_nulls);
            assert!(array.has_non_nulls);
        }
        other => panic!("Expected array datum, got {:?}", other),
    }
    assert!(vars.referenced_slots().is_empty());
}

#[test]
fn test_out_of_range_ordinal() {
    let mut vars = int_context(4);
    let err = process("@5", &mut vars).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Bind);
    assert_eq!(
        err.to_string(),
        "Placeholder @5 is out of range: the row has 4 columns"
    );
    assert!(vars.referenced_slots().is_empty());
}

#[test]
fn test_processing_is_idempotent() {
    let mut vars = int_context(3);
    let first = process("@3 + 2 * 3", &mut vars).unwrap();
    let referenced = vars.referenced_slots();

    let second = process("@3 + 2 * 3", &mut vars).unwrap();
    assert_eq!(first, second);
    assert_eq!(vars.referenced_slots(), referenced);
    assert_eq!(second.to_string(), "var2 + 6");
}

#[test]
fn test_error_kinds() {
    let mut vars = int_context(2);

    let cases = [
        ("(@1 + ", ErrorKind::Parse),
        ("@1 @2", ErrorKind::Parse),
        ("@0", ErrorKind::Bind),
        ("@3", ErrorKind::Bind),
        ("@1 AND @2", ErrorKind::Type),
        ("nope(@1)", ErrorKind::Type),
        ("ARRAY[]", ErrorKind::Type),
        ("1 / 0", ErrorKind::Eval),
        ("9223372036854775807 * 2", ErrorKind::Eval),
        ("sqrt(-4.0)", ErrorKind::Eval),
        ("'abc'::INT", ErrorKind::Eval),
    ];
    for (text, kind) in cases {
        let err = process(text, &mut vars).unwrap_err();
        assert_eq!(err.kind(), kind, "{}: {}", text, err);
    }
}

#[test]
fn test_cancelled_context_fails_function_fold() {
    let flag = CancelFlag::new();
    let eval_ctx = EvalContext::with_cancel_flag(flag.clone());
    let mut vars = int_context(1);

    let spec = ExpressionSpec::new("@1 + abs(-2)");
    let processed =
        process_expression(&spec, &eval_ctx, &SemaContext::default(), &mut vars).unwrap();
    assert_eq!(processed.to_string(), "var0 + 2");

    flag.cancel();
    let err = process_expression(&spec, &eval_ctx, &SemaContext::default(), &mut vars)
        .unwrap_err();
    assert_eq!(err, ExpressionError::Cancelled);
    assert_eq!(err.kind(), ErrorKind::Eval);
}

#[test]
fn test_named_columns_render_by_name() {
    let shape = RowShape::with_names(
        vec![DataType::Int, DataType::String],
        vec!["qty".to_string(), "label".to_string()],
    );
    let mut stage = StageExpressions::for_row_shape(shape);

    let processed = stage
        .add(&ExpressionSpec::new("CASE WHEN @1 > 10 THEN upper(@2) ELSE @2 END"))
        .unwrap();
    assert_eq!(
        processed.to_string(),
        "CASE WHEN qty > 10 THEN upper(label) ELSE label END"
    );

    let out = stage
        .evaluate_row(&[Value::Int(12), Value::String("box".to_string())])
        .unwrap();
    assert_eq!(out, vec![Value::String("BOX".to_string())]);
}

#[test]
fn test_independent_contexts_in_parallel() {
    let specs = Arc::new(vec![
        ExpressionSpec::new("@1 + @2"),
        ExpressionSpec::new("@4 * 2"),
        ExpressionSpec::new("ARRAY[@2, 3]"),
    ]);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let specs = Arc::clone(&specs);
            thread::spawn(move || {
                let mut stage =
                    StageExpressions::for_row_shape(RowShape::new(vec![DataType::Int; 4]));
                // Each thread prepares a different prefix of the same list
                for spec in specs.iter().take(i % specs.len() + 1) {
                    stage.add(spec).unwrap();
                }
                (i, stage.needed_columns())
            })
        })
        .collect();

    for handle in handles {
        let (i, needed) = handle.join().unwrap();
        let expected = match i % 3 {
            0 => vec![0, 1],
            1 => vec![0, 1, 3],
            _ => vec![0, 1, 3],
        };
        assert_eq!(needed, expected, "thread {}", i);
    }
}

#[test]
fn test_payload_round_trip_through_stage() {
    let bytes = ExpressionSpec::new("@2 - 1").encode().unwrap();
    let spec = ExpressionSpec::decode(&bytes).unwrap();

    let mut stage = StageExpressions::for_row_shape(RowShape::new(vec![DataType::Int; 2]));
    stage.add(&spec).unwrap();
    assert_eq!(stage.needed_columns(), vec![1]);

    let err = ExpressionSpec::decode(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

fn random_row(rng: &mut StdRng) -> Vec<Value> {
    let nullable = if rng.gen_bool(0.2) {
        Value::Null
    } else {
        Value::Int(rng.gen_range(-50..50))
    };
    let label: String = (0..rng.gen_range(0..4))
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect();
    vec![
        Value::Int(rng.gen_range(-100..100)),
        Value::Int(rng.gen_range(-100..100)),
        nullable,
        Value::String(label),
    ]
}

#[test]
fn test_folding_does_not_change_results() {
    let shape = RowShape::new(vec![
        DataType::Int,
        DataType::Int,
        DataType::Int,
        DataType::String,
    ]);
    let texts = [
        "@1 * (2 + 3) - @2",
        "@1 / (10 - 2 * 5) + @2",
        "@1 % (3 * 2)",
        "CASE WHEN @1 > 1 + 1 THEN @2 * 2 ELSE abs(-7) END",
        "@1::FLOAT / 4 + 0.5",
        "@3 IS NULL OR @1 < @2 + 10",
        "NOT (@3 > 0) AND true",
        "ARRAY[@1, 1 + 1, @3]",
        "length(upper('ab') || @4)",
        "@3 + NULL",
    ];
    let eval_ctx = EvalContext::default();
    let sema_ctx = SemaContext::default();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for text in texts {
        let mut vars = VarBindingContext::for_row_shape(shape.clone());
        let processed =
            process_expression(&ExpressionSpec::new(text), &eval_ctx, &sema_ctx, &mut vars)
                .unwrap();

        let mut unfolded_vars = VarBindingContext::for_row_shape(shape.clone());
        let bound = bind_ordinals(parse(text).unwrap(), &mut unfolded_vars).unwrap();
        let unfolded = ProcessedExpression::Tree(resolve_types(&bound, &sema_ctx).unwrap());
        assert_eq!(processed.data_type(), unfolded.data_type(), "{}", text);

        for _ in 0..50 {
            let row = random_row(&mut rng);
            assert_eq!(
                processed.evaluate(&row, &eval_ctx),
                unfolded.evaluate(&row, &eval_ctx),
                "{} on {:?}",
                text,
                row
            );
        }
    }
}

#[test]
fn test_array_with_null_element() {
    let mut vars = int_context(1);
    let processed = process("ARRAY[@1, NULL]", &mut vars).unwrap();
    assert_eq!(processed.data_type(), DataType::array_of(DataType::Int));

    let value = processed
        .evaluate(&[Value::Int(5)], &EvalContext::default())
        .unwrap();
    assert_eq!(
        value,
        Value::Array(ArrayValue::new(DataType::Int, vec![Value::Int(5), Value::Null]))
    );
}

#[test]
fn test_deep_nesting_is_a_parse_error() {
    // Worker threads get the default stack, so run there rather than on main
    let handle = thread::spawn(|| {
        let mut vars = int_context(1);
        let nested = |n: usize| format!("{}@1 + 1{}", "(".repeat(n), ")".repeat(n));

        let processed = process(&nested(100), &mut vars).unwrap();
        assert_eq!(processed.to_string(), "var0 + 1");

        let err = process(&nested(10_000), &mut vars).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("nested too deeply"), "{}", err);

        let err = process(&"NOT ".repeat(10_000), &mut vars).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    });
    handle.join().unwrap();
}
