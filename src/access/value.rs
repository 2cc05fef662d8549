use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types a scalar expression can produce
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type of an untyped NULL; adopts whatever type the context demands
    Unknown,
    Boolean,
    Int,
    Float,
    String,
    Array(Box<DataType>),
}

impl DataType {
    /// Map a SQL type name (case-insensitive, optional `[]` suffixes) to a type
    pub fn from_sql_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return Self::from_sql_name(element).map(Self::array_of);
        }

        match name.to_uppercase().as_str() {
            "BOOL" | "BOOLEAN" => Some(DataType::Boolean),
            "INT" | "INTEGER" | "INT8" | "INT64" | "BIGINT" => Some(DataType::Int),
            "FLOAT" | "FLOAT8" | "DOUBLE" | "REAL" => Some(DataType::Float),
            "STRING" | "TEXT" | "VARCHAR" => Some(DataType::String),
            _ => None,
        }
    }

    pub fn array_of(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, DataType::Unknown)
    }

    /// Whether an explicit cast from this type to `target` is allowed
    pub fn can_cast_to(&self, target: &DataType) -> bool {
        if self == target {
            return true;
        }

        match (self, target) {
            (DataType::Unknown, _) => true,
            (DataType::Array(from), DataType::Array(to)) => from.can_cast_to(to),
            (DataType::Array(_), _) | (_, DataType::Array(_)) => false,
            (DataType::Boolean, DataType::Float) | (DataType::Float, DataType::Boolean) => false,
            (_, DataType::Unknown) => false,
            _ => true,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Unknown => write!(f, "unknown"),
            DataType::Boolean => write!(f, "BOOL"),
            DataType::Int => write!(f, "INT8"),
            DataType::Float => write!(f, "FLOAT8"),
            DataType::String => write!(f, "STRING"),
            DataType::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// Array datum
///
/// `has_nulls` and `has_non_nulls` are derived from `elements` when the array
/// is built and let consumers skip a scan of the elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub element_type: DataType,
    pub elements: Vec<Value>,
    pub has_nulls: bool,
    pub has_non_nulls: bool,
}

impl ArrayValue {
    pub fn new(element_type: DataType, elements: Vec<Value>) -> Self {
        let has_nulls = elements.iter().any(Value::is_null);
        let has_non_nulls = elements.iter().any(|e| !e.is_null());
        Self {
            element_type,
            elements,
            has_nulls,
            has_non_nulls,
        }
    }
}

/// Runtime value produced by evaluating an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(ArrayValue),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Unknown,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::String,
            Value::Array(array) => DataType::array_of(array.element_type.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_nan() => write!(f, "'NaN'"),
            Value::Float(x) if x.is_infinite() => {
                write!(f, "'{}Infinity'", if *x < 0.0 { "-" } else { "" })
            }
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Array(array) => {
                write!(f, "ARRAY[")?;
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}
