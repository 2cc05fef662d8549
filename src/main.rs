//! rowexpr - prepare and evaluate row expressions from the command line

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use log::info;
use rowexpr::access::{DataType, Value};
use rowexpr::binding::{RowShape, VarBindingContext};
use rowexpr::expression::{cast_value, EvalContext, SemaContext};
use rowexpr::flow::{ExpressionSpec, StageExpressions};

/// Prepare expressions over a row shape and optionally evaluate them
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expressions to prepare; `@k` refers to column k (1-based)
    #[arg(required = true)]
    expressions: Vec<String>,

    /// Column types of the input row, e.g. INT,FLOAT,STRING
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Column display names, in column order
    #[arg(short, long, value_delimiter = ',')]
    names: Vec<String>,

    /// Row to evaluate the prepared expressions against, e.g. 1,2.5,abc
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    row: Option<Vec<String>>,

    /// Reject function calls
    #[arg(long)]
    no_functions: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let types = args
        .columns
        .iter()
        .map(|name| {
            DataType::from_sql_name(name).ok_or_else(|| anyhow!("Unknown column type: {}", name))
        })
        .collect::<Result<Vec<_>>>()?;
    let shape = RowShape::with_names(types, args.names.clone());
    info!("Row shape has {} columns", shape.len());

    let sema_ctx = if args.no_functions {
        SemaContext::without_functions()
    } else {
        SemaContext::default()
    };
    let mut stage = StageExpressions::new(
        VarBindingContext::for_row_shape(shape),
        EvalContext::default(),
        sema_ctx,
    );

    for text in &args.expressions {
        let processed = stage
            .add(&ExpressionSpec::new(text.as_str()))
            .with_context(|| format!("Failed to prepare {:?}", text))?;
        println!("{} : {}", processed, processed.data_type());
    }
    println!("needed columns: {:?}", stage.needed_columns());

    if let Some(raw_row) = &args.row {
        let types = stage.bindings().resolver().types();
        let row = parse_row(raw_row, &types)?;
        let values = stage
            .evaluate_row(&row)
            .context("Failed to evaluate row")?;
        for (text, value) in args.expressions.iter().zip(values) {
            println!("{} => {}", text, value);
        }
    }

    Ok(())
}

/// Parse textual row values according to the column types
fn parse_row(raw: &[String], types: &[DataType]) -> Result<Vec<Value>> {
    if raw.len() != types.len() {
        return Err(anyhow!(
            "Row has {} values but the shape has {} columns",
            raw.len(),
            types.len()
        ));
    }

    raw.iter()
        .zip(types)
        .map(|(text, data_type)| {
            if text.eq_ignore_ascii_case("null") {
                return Ok(Value::Null);
            }
            cast_value(Value::String(text.clone()), data_type)
                .with_context(|| format!("Invalid value {:?} for a {} column", text, data_type))
        })
        .collect()
}
